use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};

pub const COMMISSIONS_OPEN_KEY: &str = "commissions_open";
pub const BACKGROUND_IMAGE_KEY: &str = "background_image";
pub const PROFILE_IMAGE_KEY: &str = "admin_profile_image";

const COMMISSIONS_OPEN_DESCRIPTION: &str = "Whether commissions are currently open";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SiteSetting {
    pub id: i32,
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSettingRequest {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommissionsStatus {
    pub commissions_open: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommissionsStatusQuery {
    pub commissions_open: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommissionsStatusUpdated {
    pub commissions_open: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeResponse {
    pub message: String,
    pub created_settings: Vec<String>,
}

/// A setting row the service seeds when asked to initialize defaults.
pub struct DefaultSetting {
    pub key: &'static str,
    pub value: String,
    pub description: &'static str,
}

pub fn default_settings() -> Vec<DefaultSetting> {
    let work_hours = serde_json::json!({
        "monday": "09:00-17:00",
        "tuesday": "09:00-17:00",
        "wednesday": "09:00-17:00",
        "thursday": "09:00-17:00",
        "friday": "09:00-17:00",
        "saturday": "Closed",
        "sunday": "Closed",
    });

    vec![
        DefaultSetting {
            key: COMMISSIONS_OPEN_KEY,
            value: "true".into(),
            description: COMMISSIONS_OPEN_DESCRIPTION,
        },
        DefaultSetting {
            key: "terms_of_service",
            value: "# Terms of Service\n\nDefault terms of service...".into(),
            description: "Terms of service content",
        },
        DefaultSetting {
            key: "pricing_info",
            value: "[]".into(),
            description: "Pricing information in JSON format",
        },
        DefaultSetting {
            key: "work_hours",
            value: work_hours.to_string(),
            description: "Work hours in JSON format",
        },
    ]
}

/// Stored flag value; anything other than `true` (any case) means closed,
/// and an absent row means open.
pub fn commissions_open_from(setting: Option<&SiteSetting>) -> bool {
    setting.is_none_or(|s| s.value.trim().eq_ignore_ascii_case("true"))
}

const SETTING_COLUMNS: &str = "id, key, value, description, updated_at";

impl SiteSetting {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SiteSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM site_settings ORDER BY key"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_key<'e, E: PgExecutor<'e>>(
        executor: E,
        key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SiteSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM site_settings WHERE key = $1"
        ))
        .bind(key)
        .fetch_optional(executor)
        .await
    }

    /// Same as `find_by_key`, locking the row until the transaction ends.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SiteSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM site_settings WHERE key = $1 FOR UPDATE"
        ))
        .bind(key)
        .fetch_optional(executor)
        .await
    }

    pub async fn create(pool: &PgPool, req: CreateSettingRequest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SiteSetting>(&format!(
            r#"
            INSERT INTO site_settings (key, value, description)
            VALUES ($1, $2, $3)
            RETURNING {SETTING_COLUMNS}
            "#
        ))
        .bind(req.key)
        .bind(req.value)
        .bind(req.description)
        .fetch_one(pool)
        .await
    }

    /// Insert-or-update by key. An existing description survives when
    /// `description` is `None`.
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SiteSetting>(&format!(
            r#"
            INSERT INTO site_settings (key, value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                description = COALESCE(EXCLUDED.description, site_settings.description),
                updated_at = NOW()
            RETURNING {SETTING_COLUMNS}
            "#
        ))
        .bind(key)
        .bind(value)
        .bind(description)
        .fetch_one(executor)
        .await
    }

    /// Inserts the row only when `key` is unused. Returns whether it was inserted.
    pub async fn insert_if_missing<'e, E: PgExecutor<'e>>(
        executor: E,
        key: &str,
        value: &str,
        description: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO site_settings (key, value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(pool: &PgPool, key: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM site_settings WHERE key = $1")
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn commissions_open(pool: &PgPool) -> Result<bool, sqlx::Error> {
        let setting = Self::find_by_key(pool, COMMISSIONS_OPEN_KEY).await?;
        Ok(commissions_open_from(setting.as_ref()))
    }

    pub async fn set_commissions_open(pool: &PgPool, open: bool) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_key(pool, COMMISSIONS_OPEN_KEY).await?;
        let description = existing.is_none().then_some(COMMISSIONS_OPEN_DESCRIPTION);
        Self::upsert(
            pool,
            COMMISSIONS_OPEN_KEY,
            if open { "true" } else { "false" },
            description,
        )
        .await
    }

    /// Seeds every default whose key is missing, all in one transaction.
    pub async fn initialize_defaults(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::new();
        for default in default_settings() {
            if Self::insert_if_missing(&mut *tx, default.key, &default.value, default.description)
                .await?
            {
                created.push(default.key.to_string());
            }
        }
        tx.commit().await?;

        if !created.is_empty() {
            tracing::info!("Seeded default settings: {}", created.join(", "));
        }
        Ok(created)
    }
}
