//! 安全限值内存实现

use crate::error::StorageError;
use crate::models::SafetyLimitRecord;
use crate::traits::SafetyLimitStore;
use std::sync::RwLock;

/// 安全限值内存存储
pub struct InMemorySafetyLimitStore {
    limits: RwLock<Vec<SafetyLimitRecord>>,
}

impl InMemorySafetyLimitStore {
    pub fn new() -> Self {
        Self {
            limits: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemorySafetyLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SafetyLimitStore for InMemorySafetyLimitStore {
    async fn find_enabled(
        &self,
        device_id: &str,
        parameter_name: &str,
    ) -> Result<Option<SafetyLimitRecord>, StorageError> {
        let limits = self
            .limits
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(limits
            .iter()
            .find(|item| {
                item.enabled
                    && item.device_id == device_id
                    && item.parameter_name == parameter_name
            })
            .cloned())
    }

    async fn put(&self, record: SafetyLimitRecord) -> Result<(), StorageError> {
        let mut limits = self
            .limits
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if let Some(existing) = limits.iter_mut().find(|item| {
            item.device_id == record.device_id && item.parameter_name == record.parameter_name
        }) {
            *existing = record;
        } else {
            limits.push(record);
        }
        Ok(())
    }
}
