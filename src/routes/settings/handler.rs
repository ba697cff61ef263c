use axum::{
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    database::is_unique_violation,
    error::{AppError, AppResult, write_failed},
    extract::{Json, Multipart, Path, Query},
    middleware::AdminUser,
    routes::MessageResponse,
    utils::upload::{self, UploadedImage},
};

use super::model::{
    BACKGROUND_IMAGE_KEY, CommissionsStatus, CommissionsStatusQuery, CommissionsStatusUpdated,
    CreateSettingRequest, InitializeResponse, PROFILE_IMAGE_KEY, SettingUpdate, SiteSetting,
};

fn not_found(key: &str) -> AppError {
    AppError::not_found(format!("Setting with key '{}' not found", key))
}

fn already_exists(key: &str) -> AppError {
    AppError::bad_request(format!("Setting with key '{}' already exists", key))
}

#[axum::debug_handler]
pub async fn list_settings(State(state): State<AppState>) -> AppResult<Json<Vec<SiteSetting>>> {
    Ok(Json(SiteSetting::list(&state.pool).await?))
}

#[axum::debug_handler]
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<SiteSetting>> {
    SiteSetting::find_by_key(&state.pool, &key)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&key))
}

#[axum::debug_handler]
pub async fn create_setting(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateSettingRequest>,
) -> AppResult<(StatusCode, Json<SiteSetting>)> {
    if req.key.trim().is_empty() {
        return Err(AppError::bad_request("key is required"));
    }
    if SiteSetting::find_by_key(&state.pool, &req.key).await?.is_some() {
        return Err(already_exists(&req.key));
    }

    let key = req.key.clone();
    let setting = SiteSetting::create(&state.pool, req).await.map_err(|e| {
        if is_unique_violation(&e) {
            already_exists(&key)
        } else {
            write_failed("creating setting", e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(setting)))
}

/// Upsert: a missing key is created, an existing one overwritten in place.
#[axum::debug_handler]
pub async fn update_setting(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(key): Path<String>,
    Json(update): Json<SettingUpdate>,
) -> AppResult<Json<SiteSetting>> {
    let setting = SiteSetting::upsert(
        &state.pool,
        &key,
        &update.value,
        update.description.as_deref(),
    )
    .await
    .map_err(|e| write_failed("updating setting", e))?;

    tracing::debug!("Setting {} now {:?}", setting.key, setting.value);
    Ok(Json(setting))
}

#[axum::debug_handler]
pub async fn delete_setting(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(key): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let deleted = SiteSetting::delete(&state.pool, &key)
        .await
        .map_err(|e| write_failed("deleting setting", e))?;
    if deleted == 0 {
        return Err(not_found(&key));
    }
    Ok(Json(MessageResponse::new(format!(
        "Setting '{}' deleted successfully",
        key
    ))))
}

/// One of the image-valued settings and where its files live.
struct ImageSetting {
    key: &'static str,
    subdir: &'static str,
    file_prefix: &'static str,
    default_description: &'static str,
    action: &'static str,
}

const BACKGROUND: ImageSetting = ImageSetting {
    key: BACKGROUND_IMAGE_KEY,
    subdir: "backgrounds",
    file_prefix: "background_",
    default_description: "Site background image",
    action: "uploading background image",
};

const PROFILE: ImageSetting = ImageSetting {
    key: PROFILE_IMAGE_KEY,
    subdir: "profiles",
    file_prefix: "profile_",
    default_description: "Admin profile image",
    action: "uploading profile image",
};

async fn read_image_form(
    mut multipart: axum::extract::Multipart,
    max_size: usize,
) -> AppResult<(UploadedImage, Option<String>)> {
    let mut image = None;
    let mut description = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or_default() {
            "image" => image = Some(upload::read_image_field(field, max_size).await?),
            "description" => {
                description = Some(field.text().await?).filter(|d| !d.trim().is_empty())
            }
            other => tracing::debug!("Ignoring unknown image form field {:?}", other),
        }
    }
    let image = image.ok_or_else(|| AppError::bad_request("image is required"))?;
    Ok((image, description))
}

/// Stores the new file, points the setting at it inside a transaction, and
/// only then removes the file the setting used to reference.
async fn replace_setting_image(
    state: &AppState,
    target: &ImageSetting,
    image: UploadedImage,
    description: Option<String>,
) -> AppResult<SiteSetting> {
    let stored = upload::store_image(
        &state.config.upload_dir,
        target.subdir,
        target.file_prefix,
        &image,
    )
    .await
    .map_err(|e| AppError::Internal(format!("failed to store {} file: {}", target.key, e)))?;

    let result: Result<(SiteSetting, Option<SiteSetting>), sqlx::Error> = async {
        let mut tx = state.pool.begin().await?;
        let previous = SiteSetting::find_for_update(&mut *tx, target.key).await?;
        let description = match (&previous, description.as_deref()) {
            (_, Some(d)) => Some(d),
            (None, None) => Some(target.default_description),
            (Some(_), None) => None,
        };
        let saved = SiteSetting::upsert(&mut *tx, target.key, &stored.url, description).await?;
        tx.commit().await?;
        Ok((saved, previous))
    }
    .await;

    match result {
        Ok((saved, previous)) => {
            let own_prefix = format!("{}{}/", upload::URL_ROOT, target.subdir);
            if let Some(old) = previous.filter(|p| p.value.starts_with(&own_prefix)) {
                upload::remove_stored(&state.config.upload_dir, &old.value).await;
            }
            tracing::info!("{} now points at {}", target.key, saved.value);
            Ok(saved)
        }
        Err(e) => {
            upload::remove_path(&stored.path).await;
            Err(write_failed(target.action, e))
        }
    }
}

#[axum::debug_handler]
pub async fn upload_background_image(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Multipart(multipart): Multipart,
) -> AppResult<Json<SiteSetting>> {
    let (image, description) = read_image_form(multipart, state.config.max_background_size).await?;
    let setting = replace_setting_image(&state, &BACKGROUND, image, description).await?;
    Ok(Json(setting))
}

#[axum::debug_handler]
pub async fn upload_profile_image(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Multipart(multipart): Multipart,
) -> AppResult<Json<SiteSetting>> {
    let (image, description) = read_image_form(multipart, state.config.max_profile_size).await?;
    let setting = replace_setting_image(&state, &PROFILE, image, description).await?;
    Ok(Json(setting))
}

#[axum::debug_handler]
pub async fn get_commissions_status(
    State(state): State<AppState>,
) -> AppResult<Json<CommissionsStatus>> {
    let commissions_open = SiteSetting::commissions_open(&state.pool).await?;
    Ok(Json(CommissionsStatus { commissions_open }))
}

#[axum::debug_handler]
pub async fn update_commissions_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<CommissionsStatusQuery>,
) -> AppResult<Json<CommissionsStatusUpdated>> {
    SiteSetting::set_commissions_open(&state.pool, query.commissions_open)
        .await
        .map_err(|e| write_failed("updating commissions status", e))?;

    let word = if query.commissions_open { "open" } else { "closed" };
    tracing::info!("{} marked commissions {}", admin.email, word);
    Ok(Json(CommissionsStatusUpdated {
        commissions_open: query.commissions_open,
        message: format!("Commissions status updated to {}", word),
    }))
}

#[axum::debug_handler]
pub async fn initialize_settings(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<InitializeResponse>> {
    let created_settings = SiteSetting::initialize_defaults(&state.pool)
        .await
        .map_err(|e| write_failed("initializing settings", e))?;

    Ok(Json(InitializeResponse {
        message: "Default settings initialized".into(),
        created_settings,
    }))
}
