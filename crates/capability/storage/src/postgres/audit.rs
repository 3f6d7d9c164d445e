//! Postgres 审计日志实现

use crate::error::StorageError;
use crate::models::AuditEntryRecord;
use crate::traits::AuditLogStore;
use sqlx::{PgPool, Row};

pub struct PgAuditLogStore {
    pub pool: PgPool,
}

impl PgAuditLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditLogStore for PgAuditLogStore {
    async fn append(&self, record: AuditEntryRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into recommendation_audit \
             (audit_id, recommendation_id, action, performed_by, ts, details) \
             values ($1, $2, $3, $4, to_timestamp($5 / 1000.0), $6::jsonb)",
        )
        .bind(&record.audit_id)
        .bind(&record.recommendation_id)
        .bind(&record.action)
        .bind(&record.performed_by)
        .bind(record.ts_ms as f64)
        .bind(&record.details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for(
        &self,
        recommendation_id: &str,
    ) -> Result<Vec<AuditEntryRecord>, StorageError> {
        let rows = sqlx::query(
            "select audit_id, recommendation_id, action, performed_by, \
             (extract(epoch from ts) * 1000)::bigint as ts_ms, details::text as details \
             from recommendation_audit \
             where recommendation_id = $1 \
             order by ts asc",
        )
        .bind(recommendation_id)
        .fetch_all(&self.pool)
        .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(AuditEntryRecord {
                audit_id: row.try_get("audit_id")?,
                recommendation_id: row.try_get("recommendation_id")?,
                action: row.try_get("action")?,
                performed_by: row.try_get("performed_by")?,
                ts_ms: row.try_get("ts_ms")?,
                details: row.try_get("details")?,
            });
        }
        Ok(items)
    }
}
