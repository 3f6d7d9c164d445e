//! Postgres 安全限值实现

use crate::error::StorageError;
use crate::models::SafetyLimitRecord;
use crate::traits::SafetyLimitStore;
use sqlx::{PgPool, Row};

pub struct PgSafetyLimitStore {
    pub pool: PgPool,
}

impl PgSafetyLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SafetyLimitStore for PgSafetyLimitStore {
    async fn find_enabled(
        &self,
        device_id: &str,
        parameter_name: &str,
    ) -> Result<Option<SafetyLimitRecord>, StorageError> {
        let row = sqlx::query(
            "select device_id, parameter_name, min_value, max_value, max_rate_of_change, \
             requires_approval, enabled \
             from safety_limits \
             where device_id = $1 and parameter_name = $2 and enabled = true",
        )
        .bind(device_id)
        .bind(parameter_name)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(SafetyLimitRecord {
            device_id: row.try_get("device_id")?,
            parameter_name: row.try_get("parameter_name")?,
            min_value: row.try_get("min_value")?,
            max_value: row.try_get("max_value")?,
            max_rate_of_change: row.try_get("max_rate_of_change")?,
            requires_approval: row.try_get("requires_approval")?,
            enabled: row.try_get("enabled")?,
        }))
    }

    async fn put(&self, record: SafetyLimitRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into safety_limits \
             (device_id, parameter_name, min_value, max_value, max_rate_of_change, \
              requires_approval, enabled) \
             values ($1, $2, $3, $4, $5, $6, $7) \
             on conflict (device_id, parameter_name) do update set \
             min_value = excluded.min_value, max_value = excluded.max_value, \
             max_rate_of_change = excluded.max_rate_of_change, \
             requires_approval = excluded.requires_approval, enabled = excluded.enabled",
        )
        .bind(&record.device_id)
        .bind(&record.parameter_name)
        .bind(record.min_value)
        .bind(record.max_value)
        .bind(record.max_rate_of_change)
        .bind(record.requires_approval)
        .bind(record.enabled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
