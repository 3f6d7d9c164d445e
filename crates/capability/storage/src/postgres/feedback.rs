//! Postgres 反馈队列实现

use crate::error::StorageError;
use crate::models::FeedbackItemRecord;
use crate::traits::FeedbackQueueStore;
use sqlx::{PgPool, Row};

pub struct PgFeedbackQueueStore {
    pub pool: PgPool,
}

impl PgFeedbackQueueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FeedbackQueueStore for PgFeedbackQueueStore {
    async fn enqueue(&self, record: FeedbackItemRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into feedback_queue \
             (feedback_id, record_id, device_id, predicted, confidence, priority, created_at) \
             values ($1, $2, $3, $4, $5, $6, to_timestamp($7 / 1000.0))",
        )
        .bind(&record.feedback_id)
        .bind(&record.record_id)
        .bind(&record.device_id)
        .bind(&record.predicted)
        .bind(record.confidence)
        .bind(&record.priority)
        .bind(record.created_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, limit: i64) -> Result<Vec<FeedbackItemRecord>, StorageError> {
        let rows = sqlx::query(
            "select feedback_id, record_id, device_id, predicted, confidence, priority, \
             (extract(epoch from created_at) * 1000)::bigint as created_at_ms \
             from feedback_queue \
             order by created_at desc \
             limit $1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(FeedbackItemRecord {
                feedback_id: row.try_get("feedback_id")?,
                record_id: row.try_get("record_id")?,
                device_id: row.try_get("device_id")?,
                predicted: row.try_get("predicted")?,
                confidence: row.try_get("confidence")?,
                priority: row.try_get("priority")?,
                created_at_ms: row.try_get("created_at_ms")?,
            });
        }
        Ok(items)
    }
}
