//! Image upload helpers shared by the portfolio and settings routes.
//!
//! Files land under the configured upload root as `<subdir>/<prefix><uuid><ext>`
//! and are addressed by the public URL `/uploads/<subdir>/<file>`, which is
//! also the path the static file service answers on.

use std::path::{Component, Path, PathBuf};

use axum::extract::multipart::Field;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const ALLOWED_EXTENSIONS: [&str; 5] = [".gif", ".jpeg", ".jpg", ".png", ".webp"];

pub const URL_ROOT: &str = "/uploads/";

const MB: usize = 1024 * 1024;

/// An image read out of a multipart field, already validated.
#[derive(Debug)]
pub struct UploadedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// A file written to disk together with the URL it is served on.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub url: String,
}

/// Lower-cased extension of `filename` (with the leading dot) when it is one
/// of the accepted image formats.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    let ext = format!(".{}", ext);
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn validate_image_name(filename: &str) -> AppResult<String> {
    image_extension(filename).ok_or_else(|| {
        AppError::bad_request(format!(
            "Invalid image format. Allowed formats: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })
}

fn too_large(max: usize) -> AppError {
    AppError::bad_request(format!(
        "File size too large. Maximum size is {}MB",
        max.div_ceil(MB)
    ))
}

/// Accumulates upload bytes and refuses to grow past `max`.
struct SizeGuard {
    max: usize,
    buf: Vec<u8>,
}

impl SizeGuard {
    fn new(max: usize) -> Self {
        Self {
            max,
            buf: Vec::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> AppResult<()> {
        if self.buf.len() + chunk.len() > self.max {
            return Err(too_large(self.max));
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }
}

/// Validates the file name of an `image` field, then streams its body while
/// enforcing `max` bytes. Nothing touches the disk here.
pub async fn read_image_field(mut field: Field<'_>, max: usize) -> AppResult<UploadedImage> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let extension = validate_image_name(&filename).inspect_err(|_| {
        tracing::warn!("Rejected upload with unsupported name {:?}", filename);
    })?;

    let mut guard = SizeGuard::new(max);
    while let Some(chunk) = field.chunk().await? {
        guard.push(&chunk).inspect_err(|_| {
            tracing::warn!("Rejected upload {:?}: larger than {} bytes", filename, max);
        })?;
    }

    Ok(UploadedImage {
        extension,
        bytes: guard.buf,
    })
}

/// Writes `image` to `<root>/<subdir>/<prefix><uuid><ext>`.
pub async fn store_image(
    root: &Path,
    subdir: &str,
    prefix: &str,
    image: &UploadedImage,
) -> std::io::Result<StoredFile> {
    let dir = root.join(subdir);
    tokio::fs::create_dir_all(&dir).await?;

    let filename = format!("{}{}{}", prefix, Uuid::new_v4(), image.extension);
    let path = dir.join(&filename);
    tokio::fs::write(&path, &image.bytes).await?;

    tracing::debug!("Stored upload at {}", path.display());
    Ok(StoredFile {
        path,
        url: format!("{}{}/{}", URL_ROOT, subdir, filename),
    })
}

/// Maps a public `/uploads/...` URL back to its location under `root`.
/// URLs outside the upload tree, or that try to climb out of it, map to nothing.
pub fn url_to_path(root: &Path, url: &str) -> Option<PathBuf> {
    let relative = Path::new(url.strip_prefix(URL_ROOT)?);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

/// Best-effort removal of a stored upload. Returns whether a file was deleted.
pub async fn remove_stored(root: &Path, url: &str) -> bool {
    let Some(path) = url_to_path(root, url) else {
        return false;
    };
    remove_path(&path).await
}

pub async fn remove_path(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::info!("Removed stored file {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!("Failed to remove stored file {}: {}", path.display(), e);
            false
        }
    }
}
