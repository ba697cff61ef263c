use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::routes::{Page, nullable};

pub const DEFAULT_STATUS: &str = "pending";
pub const DEFAULT_PAYMENT_STATUS: &str = "pending";
pub const DEFAULT_PROGRESS_STATUS: &str = "in_queue";

/// A commission request. `status`, `payment_status` and `progress_status`
/// are free-form; the usual values are
/// `pending | 50_paid | 100_paid | completed` for the first two and
/// `in_queue | waiting_payment | in_progress | completed` for progress.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Commission {
    pub id: String,
    pub full_name: String,
    pub discord_id: String,
    pub email: String,
    pub project_description: String,
    pub status: String,
    pub payment_status: String,
    pub progress_status: String,
    pub file_reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommissionRequest {
    pub full_name: String,
    pub discord_id: String,
    pub email: String,
    pub project_description: String,
    pub file_reference: Option<String>,
}

/// Partial update; only the fields present are written. `"notes": null`
/// clears the notes.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CommissionUpdate {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub progress_status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CommissionFilter {
    pub status_filter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionStats {
    pub total_requests: i64,
    pub pending_requests: i64,
    pub in_progress_requests: i64,
    pub completed_requests: i64,
}

impl CommissionUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.payment_status.is_none()
            && self.progress_status.is_none()
            && self.notes.is_none()
    }

    pub fn apply(self, commission: &mut Commission) {
        if let Some(status) = self.status {
            commission.status = status;
        }
        if let Some(payment_status) = self.payment_status {
            commission.payment_status = payment_status;
        }
        if let Some(progress_status) = self.progress_status {
            commission.progress_status = progress_status;
        }
        if let Some(notes) = self.notes {
            commission.notes = notes;
        }
    }
}

const COMMISSION_COLUMNS: &str = "id, full_name, discord_id, email, project_description, status, payment_status, progress_status, file_reference, notes, created_at, updated_at";

impl Commission {
    pub async fn create(pool: &PgPool, req: CreateCommissionRequest) -> Result<Self, sqlx::Error> {
        let commission = sqlx::query_as::<_, Commission>(&format!(
            r#"
            INSERT INTO commissions (
                id, full_name, discord_id, email, project_description,
                status, payment_status, progress_status, file_reference
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(req.full_name)
        .bind(req.discord_id)
        .bind(req.email)
        .bind(req.project_description)
        .bind(DEFAULT_STATUS)
        .bind(DEFAULT_PAYMENT_STATUS)
        .bind(DEFAULT_PROGRESS_STATUS)
        .bind(req.file_reference)
        .fetch_one(pool)
        .await?;

        tracing::info!("Created commission request {}", commission.id);
        Ok(commission)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Commission>(&format!(
            "SELECT {COMMISSION_COLUMNS} FROM commissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Newest first, optionally restricted to one `status`.
    pub async fn list(
        pool: &PgPool,
        page: Page,
        status: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Commission>(&format!(
            r#"
            SELECT {COMMISSION_COLUMNS}
            FROM commissions
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            OFFSET $2
            LIMIT $3
            "#
        ))
        .bind(status)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(pool)
        .await
    }

    /// Writes every mutable column of `self` back and refreshes `updated_at`.
    pub async fn save(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Commission>(&format!(
            r#"
            UPDATE commissions
            SET status = $1, payment_status = $2, progress_status = $3, notes = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(&self.status)
        .bind(&self.payment_status)
        .bind(&self.progress_status)
        .bind(&self.notes)
        .bind(&self.id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM commissions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(pool: &PgPool) -> Result<CommissionStats, sqlx::Error> {
        let (total, pending, in_progress, completed) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE progress_status = 'in_progress'),
                COUNT(*) FILTER (WHERE status = 'completed')
            FROM commissions
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(CommissionStats {
            total_requests: total,
            pending_requests: pending,
            in_progress_requests: in_progress,
            completed_requests: completed,
        })
    }
}
