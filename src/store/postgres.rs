use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use super::SeenStore;
use crate::error::StoreError;
use crate::model::ListingLink;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small pool; the pipeline never has more than one query in flight.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SeenStore for PostgresStore {
    async fn ensure_ready(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_items (
                link TEXT PRIMARY KEY,
                seen_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Seen-item table ready");
        Ok(())
    }

    async fn has(&self, link: &ListingLink) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM seen_items WHERE link = $1)")
                .bind(link.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn add(&self, link: &ListingLink) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO seen_items (link, seen_at)
            VALUES ($1, now())
            ON CONFLICT (link) DO NOTHING
            "#,
        )
        .bind(link.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
