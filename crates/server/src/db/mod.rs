use anyhow::Result;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;

mod models;

pub use models::*;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        // Ensure the directory exists
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        // seq keeps insertion order for listings
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resources (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    pub async fn list_records(&self, collection: &str) -> Result<Vec<Value>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            "SELECT body FROM resources WHERE collection = ? ORDER BY seq ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResourceRow::into_value).collect()
    }

    pub async fn get_record(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            "SELECT body FROM resources WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResourceRow::into_value).transpose()
    }

    /// Returns false when a record with the same id already exists
    pub async fn insert_record(&self, collection: &str, id: &str, body: &Value) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO resources (collection, id, body) VALUES (?, ?, ?) ON CONFLICT(collection, id) DO NOTHING",
        )
        .bind(collection)
        .bind(id)
        .bind(serde_json::to_string(body)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_record(&self, collection: &str, id: &str, body: &Value) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE resources SET body = ?, updated_at = CURRENT_TIMESTAMP WHERE collection = ? AND id = ?",
        )
        .bind(serde_json::to_string(body)?)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_record(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
