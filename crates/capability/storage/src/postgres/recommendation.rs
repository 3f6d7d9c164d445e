//! Postgres 建议存储实现

use crate::error::StorageError;
use crate::models::{AuditEntryRecord, RecommendationPatch, RecommendationRecord, status};
use crate::traits::RecommendationStore;
use sqlx::{PgPool, Row};

pub struct PgRecommendationStore {
    pub pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "recommendation_id, device_id, source_record_id, action_type, \
     target_parameter, current_value, recommended_value, unit, reasoning, confidence, priority, \
     status, is_within_safe_limits, safe_min, safe_max, \
     (extract(epoch from created_at) * 1000)::bigint as created_at_ms, \
     (extract(epoch from expires_at) * 1000)::bigint as expires_at_ms, \
     approved_by, (extract(epoch from approved_at) * 1000)::bigint as approved_at_ms, \
     notes, execution_status, \
     (extract(epoch from executed_at) * 1000)::bigint as executed_at_ms, controller_response";

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<RecommendationRecord, StorageError> {
    Ok(RecommendationRecord {
        recommendation_id: row.try_get("recommendation_id")?,
        device_id: row.try_get("device_id")?,
        source_record_id: row.try_get("source_record_id")?,
        action_type: row.try_get("action_type")?,
        target_parameter: row.try_get("target_parameter")?,
        current_value: row.try_get("current_value")?,
        recommended_value: row.try_get("recommended_value")?,
        unit: row.try_get("unit")?,
        reasoning: row.try_get("reasoning")?,
        confidence: row.try_get("confidence")?,
        priority: row.try_get("priority")?,
        status: row.try_get("status")?,
        is_within_safe_limits: row.try_get("is_within_safe_limits")?,
        safe_min: row.try_get("safe_min")?,
        safe_max: row.try_get("safe_max")?,
        created_at_ms: row.try_get("created_at_ms")?,
        expires_at_ms: row.try_get("expires_at_ms")?,
        approved_by: row.try_get("approved_by")?,
        approved_at_ms: row.try_get("approved_at_ms")?,
        notes: row.try_get("notes")?,
        execution_status: row.try_get("execution_status")?,
        executed_at_ms: row.try_get("executed_at_ms")?,
        controller_response: row.try_get("controller_response")?,
    })
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn insert(&self, record: RecommendationRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into recommendations \
             (recommendation_id, device_id, source_record_id, action_type, target_parameter, \
              current_value, recommended_value, unit, reasoning, confidence, priority, status, \
              is_within_safe_limits, safe_min, safe_max, created_at, expires_at) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
              to_timestamp($16 / 1000.0), to_timestamp($17 / 1000.0))",
        )
        .bind(&record.recommendation_id)
        .bind(&record.device_id)
        .bind(&record.source_record_id)
        .bind(&record.action_type)
        .bind(&record.target_parameter)
        .bind(record.current_value)
        .bind(record.recommended_value)
        .bind(&record.unit)
        .bind(&record.reasoning)
        .bind(record.confidence)
        .bind(record.priority)
        .bind(&record.status)
        .bind(record.is_within_safe_limits)
        .bind(record.safe_min)
        .bind(record.safe_max)
        .bind(record.created_at_ms as f64)
        .bind(record.expires_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(
        &self,
        recommendation_id: &str,
    ) -> Result<Option<RecommendationRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {SELECT_COLUMNS} from recommendations where recommendation_id = $1"
        ))
        .bind(recommendation_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(row_to_record(&row)?))
    }

    async fn transition_status(
        &self,
        recommendation_id: &str,
        from: &str,
        to: &str,
        patch: RecommendationPatch,
        audit: AuditEntryRecord,
    ) -> Result<bool, StorageError> {
        // 条件更新与审计条目同事务提交：迁移失败则一条审计都不留
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "update recommendations set status = $1, \
             approved_by = coalesce($2, approved_by), \
             approved_at = coalesce(to_timestamp($3 / 1000.0), approved_at), \
             notes = coalesce($4, notes), \
             execution_status = coalesce($5, execution_status), \
             executed_at = coalesce(to_timestamp($6 / 1000.0), executed_at), \
             controller_response = coalesce($7, controller_response) \
             where recommendation_id = $8 and status = $9",
        )
        .bind(to)
        .bind(&patch.approved_by)
        .bind(patch.approved_at_ms.map(|value| value as f64))
        .bind(&patch.notes)
        .bind(&patch.execution_status)
        .bind(patch.executed_at_ms.map(|value| value as f64))
        .bind(&patch.controller_response)
        .bind(recommendation_id)
        .bind(from)
        .execute(&mut *tx)
        .await?;
        let transitioned = result.rows_affected() > 0;
        if transitioned {
            sqlx::query(
                "insert into recommendation_audit \
                 (audit_id, recommendation_id, action, performed_by, ts, details) \
                 values ($1, $2, $3, $4, to_timestamp($5 / 1000.0), $6::jsonb)",
            )
            .bind(&audit.audit_id)
            .bind(&audit.recommendation_id)
            .bind(&audit.action)
            .bind(&audit.performed_by)
            .bind(audit.ts_ms as f64)
            .bind(&audit.details)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(transitioned)
    }

    async fn expire_stale(&self, now_ms: i64) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "update recommendations set status = $1 \
             where status = $2 and expires_at <= to_timestamp($3 / 1000.0)",
        )
        .bind(status::EXPIRED)
        .bind(status::PENDING)
        .bind(now_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_pending(
        &self,
        device_id: Option<&str>,
        now_ms: i64,
    ) -> Result<Vec<RecommendationRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {SELECT_COLUMNS} from recommendations \
             where status = $1 and expires_at > to_timestamp($2 / 1000.0) \
             and ($3::text is null or device_id = $3) \
             order by priority asc, created_at asc"
        ))
        .bind(status::PENDING)
        .bind(now_ms as f64)
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_record(&row)?);
        }
        Ok(items)
    }

    async fn history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {SELECT_COLUMNS} from recommendations \
             where device_id = $1 \
             order by created_at desc \
             limit $2"
        ))
        .bind(device_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_record(&row)?);
        }
        Ok(items)
    }
}
