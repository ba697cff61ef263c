use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "Commission Art Backend API";

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

impl ServiceInfo {
    pub fn new(api_prefix: &str) -> Self {
        let prefix = api_prefix.trim_end_matches('/');
        let endpoints = ["auth", "commissions", "portfolio", "settings"]
            .into_iter()
            .map(|name| (name.to_string(), format!("{}/{}", prefix, name)))
            .chain([("uploads".to_string(), "/uploads".to_string())])
            .chain([("health".to_string(), "/health".to_string())])
            .collect();

        Self {
            message: format!("{} is running", SERVICE_NAME),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadDirs {
    pub portfolio: bool,
    pub profiles: bool,
    pub backgrounds: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uploads: UploadDirs,
}
