// Postgres snapshot store: one flat table keyed by record id.

use std::time::Duration;

use async_trait::async_trait;
use quakewatch_common::Record;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;
use crate::SnapshotStore;

pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a store without connecting. An unreachable database shows up as
    /// failed store calls instead of a startup error.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Snapshot store migrations applied");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn scan_all(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM snapshot_records ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<()> {
        sqlx::query("DELETE FROM snapshot_records WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn put_item(&self, record: &Record) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshot_records (id, item)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
                SET item = EXCLUDED.item,
                    stored_at = now()
            "#,
        )
        .bind(&record.id)
        .bind(Value::Object(record.to_item()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
