use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::{models::PhotoRecord, ports::PhotoStore};

const CREATE_PHOTOS_TABLE: &str = "CREATE TABLE IF NOT EXISTS photos (
    id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    image_data  BYTEA NOT NULL,
    title       TEXT,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

/// The shared photo table, backed by PostgreSQL through an `sqlx` pool.
///
/// Ids and creation timestamps are assigned by the database. Image bytes
/// are stored as a raw `BYTEA` column; base64 never reaches the wire.
pub struct PostgresPhotoStore {
    pool: PgPool,
}

impl PostgresPhotoStore {
    /// Connect to the database and make sure the photos table exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .context("connecting to the photo database")?;
        Self::from_pool(pool).await
    }

    /// Build the store on an existing pool. Runs the table migration.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        sqlx::query(CREATE_PHOTOS_TABLE)
            .execute(&pool)
            .await
            .context("creating the photos table")?;
        Ok(Self { pool })
    }
}

/// Decode a row into the explicit record schema. A shape mismatch fails
/// here instead of leaking dynamically typed values into the domain.
fn record_from_row(row: &PgRow) -> Result<PhotoRecord> {
    Ok(PhotoRecord {
        id: row.try_get("id")?,
        image_data: row.try_get("image_data")?,
        title: row.try_get("title")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl PhotoStore for PostgresPhotoStore {
    async fn insert(&self, image_data: &[u8], title: Option<&str>) -> Result<PhotoRecord> {
        let row = sqlx::query(
            "INSERT INTO photos (image_data, title) VALUES ($1, $2) \
             RETURNING id, title, created_at",
        )
        .bind(image_data)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(PhotoRecord {
            id: row.try_get("id")?,
            image_data: image_data.to_vec(),
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn fetch_all(&self) -> Result<Vec<PhotoRecord>> {
        let rows = sqlx::query(
            "SELECT id, image_data, title, created_at FROM photos \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_title(&self, id: &Uuid, title: Option<&str>) -> Result<bool> {
        let result = sqlx::query("UPDATE photos SET title = $2 WHERE id = $1")
            .bind(id)
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
