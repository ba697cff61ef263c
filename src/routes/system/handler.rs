use std::path::Path;

use axum::extract::State;

use crate::{AppState, extract::Json};

use super::model::{HealthResponse, ServiceInfo, UploadDirs};

#[axum::debug_handler]
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo::new(&state.config.api_prefix))
}

async fn dir_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Liveness plus a database ping and a look at the upload directories.
/// Always 200; a failed ping only flips `database` to "unavailable".
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "unavailable"
        }
    };

    let config = &state.config;
    let uploads = UploadDirs {
        portfolio: dir_exists(&config.portfolio_dir()).await,
        profiles: dir_exists(&config.profile_dir()).await,
        backgrounds: dir_exists(&config.background_dir()).await,
    };

    Json(HealthResponse {
        status: "healthy".into(),
        database: database.into(),
        uploads,
    })
}
