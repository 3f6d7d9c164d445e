//! 审计日志内存实现

use crate::error::StorageError;
use crate::models::AuditEntryRecord;
use crate::traits::AuditLogStore;
use std::sync::RwLock;

/// 审计日志内存存储（仅追加）
pub struct InMemoryAuditLogStore {
    entries: RwLock<Vec<AuditEntryRecord>>,
}

impl InMemoryAuditLogStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// 同步追加。建议存储在持有记录写锁时调用，让状态迁移与
    /// 审计条目对观察者一并可见。
    pub(crate) fn append_entry(&self, record: AuditEntryRecord) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push(record);
    }
}

impl Default for InMemoryAuditLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, record: AuditEntryRecord) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        entries.push(record);
        Ok(())
    }

    async fn list_for(
        &self,
        recommendation_id: &str,
    ) -> Result<Vec<AuditEntryRecord>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<AuditEntryRecord> = entries
            .iter()
            .filter(|item| item.recommendation_id == recommendation_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.ts_ms.cmp(&b.ts_ms));
        Ok(items)
    }
}
