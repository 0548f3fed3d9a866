use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::SearchCriteria;

/// Errors that can occur when interacting with the relational store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A saved CMA search, criteria and all
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCma {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub criteria: SearchCriteria,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PostgreSQL client for saved CMA searches.
///
/// This is the only relational state the gateway owns; everything else it
/// serves is reshaped upstream data.
pub struct StorageClient {
    pool: PgPool,
}

impl StorageClient {
    /// Create a new storage client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 AS one").fetch_one(&self.pool).await?;
        Ok(row.get::<i32, _>("one") == 1)
    }

    pub async fn create_cma(
        &self,
        user_id: &str,
        name: &str,
        criteria: &SearchCriteria,
    ) -> Result<SavedCma, StorageError> {
        let criteria_json = serde_json::to_value(criteria)
            .map_err(|e| StorageError::InvalidInput(format!("Unstorable criteria: {}", e)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO cma_searches (id, user_id, name, criteria, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, user_id, name, criteria, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(criteria_json)
        .fetch_one(&self.pool)
        .await?;

        row_to_cma(row)
    }

    pub async fn list_cmas(&self, user_id: &str) -> Result<Vec<SavedCma>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, criteria, created_at, updated_at
            FROM cma_searches
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_cma).collect()
    }

    pub async fn get_cma(&self, user_id: &str, id: Uuid) -> Result<SavedCma, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, criteria, created_at, updated_at
            FROM cma_searches
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_cma(row),
            None => Err(StorageError::NotFound(format!("Saved search {}", id))),
        }
    }

    pub async fn update_cma(
        &self,
        user_id: &str,
        id: Uuid,
        name: Option<&str>,
        criteria: Option<&SearchCriteria>,
    ) -> Result<SavedCma, StorageError> {
        let criteria_json = criteria
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StorageError::InvalidInput(format!("Unstorable criteria: {}", e)))?;

        let row = sqlx::query(
            r#"
            UPDATE cma_searches
            SET name = COALESCE($3, name),
                criteria = COALESCE($4, criteria),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, criteria, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(criteria_json)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_cma(row),
            None => Err(StorageError::NotFound(format!("Saved search {}", id))),
        }
    }

    pub async fn delete_cma(&self, user_id: &str, id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM cma_searches WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Saved search {}", id)));
        }

        Ok(())
    }
}

fn row_to_cma(row: PgRow) -> Result<SavedCma, StorageError> {
    let criteria_json: serde_json::Value = row.get("criteria");
    let criteria = serde_json::from_value(criteria_json)
        .map_err(|e| StorageError::InvalidInput(format!("Corrupt stored criteria: {}", e)))?;

    Ok(SavedCma {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        criteria,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
