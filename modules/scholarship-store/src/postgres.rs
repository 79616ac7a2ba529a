//! PgEntityStore: entity documents in a single Postgres JSONB table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scholarship_common::EntityKind;
use sqlx::PgPool;
use tracing::debug;

use crate::traits::EntityStore;

/// Entity store backed by Postgres. One row per `(kind, id)`.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `entities` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                kind        TEXT         NOT NULL,
                id          TEXT         NOT NULL,
                payload     JSONB        NOT NULL,
                updated_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
                PRIMARY KEY (kind, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create entities table")?;

        Ok(())
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn load_raw(&self, kind: EntityKind, id: &str) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query_as::<_, (serde_json::Value,)>(
            r#"
            SELECT payload
            FROM entities
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(payload,)| payload))
    }

    async fn save_raw(
        &self,
        kind: EntityKind,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        // Identical payloads leave the row (and updated_at) untouched.
        let result = sqlx::query(
            r#"
            INSERT INTO entities (kind, id, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (kind, id) DO UPDATE
                SET payload = EXCLUDED.payload, updated_at = now()
                WHERE entities.payload IS DISTINCT FROM EXCLUDED.payload
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(&payload)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(kind = kind.as_str(), id, "Upsert was a no-op");
        }

        Ok(())
    }

    async fn list_raw(&self, kind: EntityKind) -> Result<Vec<(String, serde_json::Value)>> {
        let rows = sqlx::query_as::<_, (String, serde_json::Value)>(
            r#"
            SELECT id, payload
            FROM entities
            WHERE kind = $1
            ORDER BY id ASC
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
