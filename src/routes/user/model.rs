use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    utils::{hash_password_blocking, verify_password_blocking},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err("Invalid role. Must be 'user' or 'admin'".to_string()),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub display_name: Option<String>,
    pub role: String,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Credentials posted as `application/x-www-form-urlencoded`.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserBrief {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct UserActionResponse {
    pub message: String,
    pub user: UserBrief,
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub new_role: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub is_active: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

impl From<&User> for UserBrief {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

const USER_COLUMNS: &str = "id, email, hashed_password, display_name, role, avatar_url, is_active, created_at, updated_at";

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }

    pub async fn create(
        pool: &PgPool,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> AppResult<Self> {
        let hashed_password = hash_password_blocking(password).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, hashed_password, display_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(email)
        .bind(hashed_password)
        .bind(display_name)
        .bind(role.as_str())
        .fetch_one(pool)
        .await?;

        tracing::info!("Created {} account {}", user.role, user.email);
        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn admin_exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)")
            .bind(Role::Admin.as_str())
            .fetch_one(pool)
            .await
    }

    /// Looks the account up by email and checks the password. `None` covers
    /// both an unknown email and a wrong password.
    pub async fn authenticate(
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> AppResult<Option<Self>> {
        let Some(user) = Self::find_by_email(pool, email).await? else {
            return Ok(None);
        };

        match user.verify_login(password).await {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!("Stored hash for {} is unusable: {}", user.email, e);
                Ok(None)
            }
        }
    }

    pub async fn verify_login(&self, password: &str) -> AppResult<bool> {
        verify_password_blocking(password, &self.hashed_password).await
    }

    pub async fn update_role(pool: &PgPool, id: &str, role: Role) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET role = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(role.as_str())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn set_active(pool: &PgPool, id: &str, is_active: bool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_active = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(is_active)
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Creates the configured bootstrap admin unless some admin already exists.
    pub async fn ensure_bootstrap_admin(
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> AppResult<Option<Self>> {
        if Self::admin_exists(pool).await? {
            tracing::debug!("Admin account present, skipping bootstrap");
            return Ok(None);
        }
        if let Some(existing) = Self::find_by_email(pool, email).await? {
            tracing::warn!(
                "Bootstrap admin email {} belongs to a non-admin account, promoting it",
                existing.email
            );
            return Ok(Some(Self::update_role(pool, &existing.id, Role::Admin).await?));
        }
        Self::create(pool, email, password, Some("Admin"), Role::Admin)
            .await
            .map(Some)
    }
}
