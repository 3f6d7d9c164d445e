//! 建议存储内存实现

use crate::error::StorageError;
use crate::in_memory::InMemoryAuditLogStore;
use crate::models::{AuditEntryRecord, RecommendationPatch, RecommendationRecord, status};
use crate::traits::RecommendationStore;
use std::sync::{Arc, RwLock};

/// 建议内存存储。
///
/// 与审计存储共享同一实例：状态迁移在记录写锁内同步落审计条目，
/// 对观察者两者一并可见。
pub struct InMemoryRecommendationStore {
    records: RwLock<Vec<RecommendationRecord>>,
    audit: Arc<InMemoryAuditLogStore>,
}

impl InMemoryRecommendationStore {
    pub fn new(audit: Arc<InMemoryAuditLogStore>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            audit,
        }
    }
}

impl InMemoryRecommendationStore {
    /// 测试辅助：直接改写某条建议的过期时间。
    pub fn force_expiry(&self, recommendation_id: &str, expires_at_ms: i64) {
        if let Ok(mut records) = self.records.write() {
            if let Some(record) = records
                .iter_mut()
                .find(|item| item.recommendation_id == recommendation_id)
            {
                record.expires_at_ms = expires_at_ms;
            }
        }
    }
}

fn apply_patch(record: &mut RecommendationRecord, patch: RecommendationPatch) {
    if let Some(value) = patch.approved_by {
        record.approved_by = Some(value);
    }
    if let Some(value) = patch.approved_at_ms {
        record.approved_at_ms = Some(value);
    }
    if let Some(value) = patch.notes {
        record.notes = Some(value);
    }
    if let Some(value) = patch.execution_status {
        record.execution_status = Some(value);
    }
    if let Some(value) = patch.executed_at_ms {
        record.executed_at_ms = Some(value);
    }
    if let Some(value) = patch.controller_response {
        record.controller_response = Some(value);
    }
}

#[async_trait::async_trait]
impl RecommendationStore for InMemoryRecommendationStore {
    async fn insert(&self, record: RecommendationRecord) -> Result<(), StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if records
            .iter()
            .any(|item| item.recommendation_id == record.recommendation_id)
        {
            return Err(StorageError::new("duplicate recommendation_id"));
        }
        records.push(record);
        Ok(())
    }

    async fn find(
        &self,
        recommendation_id: &str,
    ) -> Result<Option<RecommendationRecord>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(records
            .iter()
            .find(|item| item.recommendation_id == recommendation_id)
            .cloned())
    }

    async fn transition_status(
        &self,
        recommendation_id: &str,
        from: &str,
        to: &str,
        patch: RecommendationPatch,
        audit: AuditEntryRecord,
    ) -> Result<bool, StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        for record in records.iter_mut() {
            if record.recommendation_id == recommendation_id {
                if record.status != from {
                    return Ok(false);
                }
                record.status = to.to_string();
                apply_patch(record, patch);
                // 记录写锁仍持有，迁移与审计对外原子
                self.audit.append_entry(audit);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn expire_stale(&self, now_ms: i64) -> Result<u64, StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut count = 0u64;
        for record in records.iter_mut() {
            if record.status == status::PENDING && record.expires_at_ms <= now_ms {
                record.status = status::EXPIRED.to_string();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_pending(
        &self,
        device_id: Option<&str>,
        now_ms: i64,
    ) -> Result<Vec<RecommendationRecord>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<RecommendationRecord> = records
            .iter()
            .filter(|item| item.status == status::PENDING && item.expires_at_ms > now_ms)
            .filter(|item| device_id.map(|id| item.device_id == id).unwrap_or(true))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.created_at_ms.cmp(&b.created_at_ms))
        });
        Ok(items)
    }

    async fn history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, StorageError> {
        let limit = limit.max(0) as usize;
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<RecommendationRecord> = records
            .iter()
            .filter(|item| item.device_id == device_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        if limit > 0 && items.len() > limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}
