use axum::{
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult, write_failed},
    extract::{Json, Multipart, Path, Query},
    middleware::AdminUser,
    routes::{MessageResponse, Page},
    utils::upload::{self, UploadedImage},
};

use super::model::{
    CategoryList, NewPortfolioItem, PortfolioFilter, PortfolioItem, PortfolioStats,
    PortfolioUpdate,
};

const UPLOAD_SUBDIR: &str = "portfolio";

fn not_found() -> AppError {
    AppError::not_found("Portfolio item not found")
}

fn parse_form_bool(field: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        _ => Err(AppError::bad_request(format!(
            "{} must be a boolean, got {:?}",
            field, value
        ))),
    }
}

#[derive(Debug, Default)]
struct PortfolioForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    is_featured: bool,
    image: Option<UploadedImage>,
}

impl PortfolioForm {
    async fn read(mut multipart: axum::extract::Multipart, max_size: usize) -> AppResult<Self> {
        let mut form = PortfolioForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => form.image = Some(upload::read_image_field(field, max_size).await?),
                "title" => form.title = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "category" => form.category = Some(field.text().await?),
                "is_featured" => form.is_featured = parse_form_bool(&name, &field.text().await?)?,
                other => tracing::debug!("Ignoring unknown portfolio form field {:?}", other),
            }
        }
        Ok(form)
    }

    fn into_parts(self) -> AppResult<(UploadedImage, String, String, Option<String>, bool)> {
        let title = required(self.title, "title")?;
        let category = required(self.category, "category")?;
        let image = self
            .image
            .ok_or_else(|| AppError::bad_request("image is required"))?;
        let description = self.description.filter(|d| !d.trim().is_empty());
        Ok((image, title, category, description, self.is_featured))
    }
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{} is required", field)))
}

#[axum::debug_handler]
pub async fn list_items(
    State(state): State<AppState>,
    Query(page): Query<Page>,
    Query(filter): Query<PortfolioFilter>,
) -> AppResult<Json<Vec<PortfolioItem>>> {
    let page = page.validate()?;
    let category = filter.category.as_deref().filter(|c| !c.is_empty());
    let items = PortfolioItem::list(&state.pool, page, category, filter.featured_only).await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> AppResult<Json<PortfolioItem>> {
    PortfolioItem::find_by_id(&state.pool, &item_id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Multipart create: the image is validated before anything is written, then
/// stored, then the row inserted. A failed insert removes the stored file.
#[axum::debug_handler]
pub async fn create_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Multipart(multipart): Multipart,
) -> AppResult<(StatusCode, Json<PortfolioItem>)> {
    let form = PortfolioForm::read(multipart, state.config.max_file_size).await?;
    let (image, title, category, description, is_featured) = form.into_parts()?;

    let stored = upload::store_image(&state.config.upload_dir, UPLOAD_SUBDIR, "", &image)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store portfolio image: {}", e)))?;

    let new_item = NewPortfolioItem {
        title,
        description,
        category,
        is_featured,
        image_url: stored.url.clone(),
    };

    match PortfolioItem::create(&state.pool, new_item).await {
        Ok(item) => {
            tracing::info!("{} added portfolio item {} ({})", admin.email, item.id, item.image_url);
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(e) => {
            upload::remove_path(&stored.path).await;
            Err(write_failed("creating portfolio item", e))
        }
    }
}

#[axum::debug_handler]
pub async fn update_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(item_id): Path<String>,
    Json(update): Json<PortfolioUpdate>,
) -> AppResult<Json<PortfolioItem>> {
    let mut item = PortfolioItem::find_by_id(&state.pool, &item_id)
        .await?
        .ok_or_else(not_found)?;

    update.apply(&mut item);
    let saved = item
        .save(&state.pool)
        .await
        .map_err(|e| write_failed("updating portfolio item", e))?;
    Ok(Json(saved))
}

#[axum::debug_handler]
pub async fn delete_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(item_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let item = PortfolioItem::find_by_id(&state.pool, &item_id)
        .await?
        .ok_or_else(not_found)?;

    upload::remove_stored(&state.config.upload_dir, &item.image_url).await;
    PortfolioItem::delete(&state.pool, &item.id)
        .await
        .map_err(|e| write_failed("deleting portfolio item", e))?;

    tracing::info!("{} deleted portfolio item {}", admin.email, item.id);
    Ok(Json(MessageResponse::new(
        "Portfolio item deleted successfully",
    )))
}

#[axum::debug_handler]
pub async fn toggle_featured(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(item_id): Path<String>,
) -> AppResult<Json<PortfolioItem>> {
    PortfolioItem::toggle_featured(&state.pool, &item_id)
        .await
        .map_err(|e| write_failed("updating featured status", e))?
        .map(Json)
        .ok_or_else(not_found)
}

#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<CategoryList>> {
    let categories = PortfolioItem::categories(&state.pool).await?;
    Ok(Json(CategoryList { categories }))
}

#[axum::debug_handler]
pub async fn portfolio_stats(State(state): State<AppState>) -> AppResult<Json<PortfolioStats>> {
    Ok(Json(PortfolioItem::stats(&state.pool).await?))
}
