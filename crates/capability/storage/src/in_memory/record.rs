//! 融合记录内存实现

use crate::error::StorageError;
use crate::models::LabeledRecord;
use crate::traits::RecordStore;
use std::sync::RwLock;

/// 融合记录内存存储
pub struct InMemoryRecordStore {
    records: RwLock<Vec<LabeledRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: LabeledRecord) -> Result<(), StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        records.push(record);
        Ok(())
    }

    async fn find(&self, record_id: &str) -> Result<Option<LabeledRecord>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(records
            .iter()
            .find(|item| item.record_id == record_id)
            .cloned())
    }
}
