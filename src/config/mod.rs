use std::env;
use std::path::PathBuf;
use std::time::Duration;

const MB: usize = 1024 * 1024;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub api_prefix: String,
    pub upload_dir: PathBuf,
    pub max_file_size: usize,
    pub max_background_size: usize,
    pub max_profile_size: usize,
    pub allowed_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration_minutes = optional("JWT_EXPIRATION_MINUTES")
            .and_then(|v| v.trim_end_matches('m').parse::<u64>().ok())
            .unwrap_or(30);

        let allowed_origins = optional("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(default_origins);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration_minutes * 60,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or("SERVER_PORT", 8000),
            api_prefix: optional("API_PREFIX").unwrap_or_else(|| "/api".into()),
            upload_dir: optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_file_size: parse_or("MAX_FILE_SIZE", 10 * MB),
            max_background_size: parse_or("MAX_BACKGROUND_SIZE", 20 * MB),
            max_profile_size: parse_or("MAX_PROFILE_SIZE", 5 * MB),
            allowed_origins,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    /// Largest request body the router accepts: the biggest upload ceiling
    /// plus room for multipart framing and text fields.
    pub fn body_limit(&self) -> usize {
        self.max_file_size
            .max(self.max_background_size)
            .max(self.max_profile_size)
            + MB
    }

    pub fn portfolio_dir(&self) -> PathBuf {
        self.upload_dir.join("portfolio")
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.upload_dir.join("profiles")
    }

    pub fn background_dir(&self) -> PathBuf {
        self.upload_dir.join("backgrounds")
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    optional(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn default_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://localhost:8000",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
