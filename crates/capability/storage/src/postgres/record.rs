//! Postgres 融合记录实现

use crate::error::StorageError;
use crate::models::LabeledRecord;
use crate::traits::RecordStore;
use sqlx::{PgPool, Row};

pub struct PgRecordStore {
    pub pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: LabeledRecord) -> Result<(), StorageError> {
        let fused = serde_json::to_string(&record.fused)?;
        let prediction = serde_json::to_string(&record.prediction)?;
        sqlx::query(
            "insert into labeled_records \
             (record_id, device_id, context_id, fused, prediction, created_at) \
             values ($1, $2, $3, $4::jsonb, $5::jsonb, to_timestamp($6 / 1000.0))",
        )
        .bind(&record.record_id)
        .bind(&record.fused.device_id)
        .bind(&record.fused.context_id)
        .bind(&fused)
        .bind(&prediction)
        .bind(record.fused.fusion_ts_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, record_id: &str) -> Result<Option<LabeledRecord>, StorageError> {
        let row = sqlx::query(
            "select record_id, fused::text as fused, prediction::text as prediction \
             from labeled_records where record_id = $1",
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let fused: String = row.try_get("fused")?;
        let prediction: String = row.try_get("prediction")?;
        Ok(Some(LabeledRecord {
            record_id: row.try_get("record_id")?,
            fused: serde_json::from_str(&fused)?,
            prediction: serde_json::from_str(&prediction)?,
        }))
    }
}
