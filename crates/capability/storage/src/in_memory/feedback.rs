//! 反馈队列内存实现

use crate::error::StorageError;
use crate::models::FeedbackItemRecord;
use crate::traits::FeedbackQueueStore;
use std::sync::RwLock;

/// 反馈队列内存存储
pub struct InMemoryFeedbackQueueStore {
    items: RwLock<Vec<FeedbackItemRecord>>,
}

impl InMemoryFeedbackQueueStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryFeedbackQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FeedbackQueueStore for InMemoryFeedbackQueueStore {
    async fn enqueue(&self, record: FeedbackItemRecord) -> Result<(), StorageError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        items.push(record);
        Ok(())
    }

    async fn list(&self, limit: i64) -> Result<Vec<FeedbackItemRecord>, StorageError> {
        let limit = limit.max(0) as usize;
        let items = self
            .items
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut result: Vec<FeedbackItemRecord> = items.iter().cloned().collect();
        result.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        if limit > 0 && result.len() > limit {
            result.truncate(limit);
        }
        Ok(result)
    }
}
