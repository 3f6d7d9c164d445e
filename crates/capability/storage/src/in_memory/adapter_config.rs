//! 适配器配置内存实现

use crate::error::StorageError;
use crate::models::AdapterConfigRecord;
use crate::traits::AdapterConfigStore;
use std::sync::RwLock;

/// 适配器配置内存存储
pub struct InMemoryAdapterConfigStore {
    records: RwLock<Vec<AdapterConfigRecord>>,
}

impl InMemoryAdapterConfigStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// 预置一批配置（本地运行与测试）。
    pub fn with_records(records: Vec<AdapterConfigRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl Default for InMemoryAdapterConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AdapterConfigStore for InMemoryAdapterConfigStore {
    async fn list_enabled(&self) -> Result<Vec<AdapterConfigRecord>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<AdapterConfigRecord> = records
            .iter()
            .filter(|item| item.enabled)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.source_name.cmp(&b.source_name));
        Ok(items)
    }

    async fn upsert(&self, record: AdapterConfigRecord) -> Result<(), StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if let Some(existing) = records
            .iter_mut()
            .find(|item| item.source_name == record.source_name)
        {
            *existing = record;
        } else {
            records.push(record);
        }
        Ok(())
    }

    async fn snapshot_version(&self) -> Result<i64, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(records
            .iter()
            .map(|item| item.updated_at_ms)
            .max()
            .unwrap_or(0))
    }
}
