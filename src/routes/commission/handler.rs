use axum::{
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult, write_failed},
    extract::{Json, Path, Query},
    middleware::AdminUser,
    routes::{MessageResponse, Page},
    utils::is_valid_email,
};

use super::model::{
    Commission, CommissionFilter, CommissionStats, CommissionUpdate, CreateCommissionRequest,
};

fn not_found() -> AppError {
    AppError::not_found("Commission request not found")
}

fn validate_create(req: &CreateCommissionRequest) -> AppResult<()> {
    let required = [
        ("full_name", &req.full_name),
        ("discord_id", &req.discord_id),
        ("project_description", &req.project_description),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(AppError::bad_request(format!("{} is required", field)));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::bad_request("Invalid email address"));
    }
    Ok(())
}

/// Public intake form; no account needed.
#[axum::debug_handler]
pub async fn create_commission(
    State(state): State<AppState>,
    Json(req): Json<CreateCommissionRequest>,
) -> AppResult<(StatusCode, Json<Commission>)> {
    validate_create(&req)?;

    let commission = Commission::create(&state.pool, req)
        .await
        .map_err(|e| write_failed("creating commission request", e))?;

    Ok((StatusCode::CREATED, Json(commission)))
}

#[axum::debug_handler]
pub async fn list_commissions(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<Page>,
    Query(filter): Query<CommissionFilter>,
) -> AppResult<Json<Vec<Commission>>> {
    let page = page.validate()?;
    let status = filter.status_filter.as_deref().filter(|s| !s.is_empty());
    let commissions = Commission::list(&state.pool, page, status).await?;
    Ok(Json(commissions))
}

#[axum::debug_handler]
pub async fn get_commission(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(commission_id): Path<String>,
) -> AppResult<Json<Commission>> {
    Commission::find_by_id(&state.pool, &commission_id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[axum::debug_handler]
pub async fn update_commission(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(commission_id): Path<String>,
    Json(update): Json<CommissionUpdate>,
) -> AppResult<Json<Commission>> {
    let mut commission = Commission::find_by_id(&state.pool, &commission_id)
        .await?
        .ok_or_else(not_found)?;

    if update.is_empty() {
        return Ok(Json(commission));
    }

    update.apply(&mut commission);
    let saved = commission
        .save(&state.pool)
        .await
        .map_err(|e| write_failed("updating commission request", e))?;

    tracing::info!(
        "{} updated commission {} (status={}, payment={}, progress={})",
        admin.email,
        saved.id,
        saved.status,
        saved.payment_status,
        saved.progress_status
    );
    Ok(Json(saved))
}

#[axum::debug_handler]
pub async fn delete_commission(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(commission_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let deleted = Commission::delete(&state.pool, &commission_id)
        .await
        .map_err(|e| write_failed("deleting commission request", e))?;
    if deleted == 0 {
        return Err(not_found());
    }

    tracing::info!("{} deleted commission {}", admin.email, commission_id);
    Ok(Json(MessageResponse::new(
        "Commission request deleted successfully",
    )))
}

#[axum::debug_handler]
pub async fn commission_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<CommissionStats>> {
    Ok(Json(Commission::stats(&state.pool).await?))
}
