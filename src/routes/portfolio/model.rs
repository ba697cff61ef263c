use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::routes::{Page, nullable};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub image_url: String,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row data for a new item whose image is already on disk.
#[derive(Debug)]
pub struct NewPortfolioItem {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub is_featured: bool,
    pub image_url: String,
}

/// Metadata-only update; the image is never replaced here.
/// `"description": null` clears the description.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PortfolioUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub featured_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortfolioStats {
    pub total_items: i64,
    pub featured_items: i64,
    pub categories: i64,
}

impl PortfolioUpdate {
    pub fn apply(self, item: &mut PortfolioItem) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(is_featured) = self.is_featured {
            item.is_featured = is_featured;
        }
    }
}

const ITEM_COLUMNS: &str =
    "id, title, description, category, image_url, is_featured, created_at, updated_at";

impl PortfolioItem {
    pub async fn create(pool: &PgPool, item: NewPortfolioItem) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            r#"
            INSERT INTO portfolio_items (id, title, description, category, image_url, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(item.title)
        .bind(item.description)
        .bind(item.category)
        .bind(item.image_url)
        .bind(item.is_featured)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM portfolio_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        page: Page,
        category: Option<&str>,
        featured_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM portfolio_items
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND (NOT $2 OR is_featured)
            ORDER BY created_at DESC
            OFFSET $3
            LIMIT $4
            "#
        ))
        .bind(category)
        .bind(featured_only)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(pool)
        .await
    }

    pub async fn save(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            r#"
            UPDATE portfolio_items
            SET title = $1, description = $2, category = $3, is_featured = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.category)
        .bind(self.is_featured)
        .bind(&self.id)
        .fetch_one(pool)
        .await
    }

    pub async fn toggle_featured(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            r#"
            UPDATE portfolio_items
            SET is_featured = NOT is_featured, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM portfolio_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Distinct item categories together with the names in
    /// `portfolio_categories`, sorted. The two sources are independent.
    pub async fn categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT category FROM portfolio_items WHERE category <> ''
            UNION
            SELECT name FROM portfolio_categories WHERE name <> ''
            ORDER BY 1
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn stats(pool: &PgPool) -> Result<PortfolioStats, sqlx::Error> {
        let (total, featured, categories) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_featured),
                COUNT(DISTINCT category)
            FROM portfolio_items
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(PortfolioStats {
            total_items: total,
            featured_items: featured,
            categories,
        })
    }
}
