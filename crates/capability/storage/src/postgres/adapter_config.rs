//! Postgres 适配器配置实现

use crate::error::StorageError;
use crate::models::AdapterConfigRecord;
use crate::traits::AdapterConfigStore;
use sqlx::{PgPool, Row};

pub struct PgAdapterConfigStore {
    pub pool: PgPool,
}

impl PgAdapterConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AdapterConfigStore for PgAdapterConfigStore {
    async fn list_enabled(&self) -> Result<Vec<AdapterConfigRecord>, StorageError> {
        let rows = sqlx::query(
            "select source_name, category, enabled, config::text as config, \
             (extract(epoch from updated_at) * 1000)::bigint as updated_at_ms \
             from adapter_configs \
             where enabled = true \
             order by source_name asc",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(AdapterConfigRecord {
                source_name: row.try_get("source_name")?,
                category: row.try_get("category")?,
                enabled: row.try_get("enabled")?,
                config: row.try_get("config")?,
                updated_at_ms: row.try_get("updated_at_ms")?,
            });
        }
        Ok(items)
    }

    async fn upsert(&self, record: AdapterConfigRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into adapter_configs (source_name, category, enabled, config, updated_at) \
             values ($1, $2, $3, $4::jsonb, to_timestamp($5 / 1000.0)) \
             on conflict (source_name) do update set \
             category = excluded.category, enabled = excluded.enabled, \
             config = excluded.config, updated_at = excluded.updated_at",
        )
        .bind(&record.source_name)
        .bind(&record.category)
        .bind(record.enabled)
        .bind(&record.config)
        .bind(record.updated_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn snapshot_version(&self) -> Result<i64, StorageError> {
        let row = sqlx::query(
            "select coalesce((extract(epoch from max(updated_at)) * 1000)::bigint, 0) as version \
             from adapter_configs",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("version")?)
    }
}
