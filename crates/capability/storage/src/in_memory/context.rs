//! 上下文查询内存实现

use crate::error::StorageError;
use crate::traits::ContextLookup;
use std::collections::HashMap;
use std::sync::RwLock;

/// 上下文内存存储（测试与本地运行）
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<String, serde_json::Map<String, serde_json::Value>>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
        }
    }

    pub fn put(&self, context_id: impl Into<String>, context: serde_json::Map<String, serde_json::Value>) {
        if let Ok(mut contexts) = self.contexts.write() {
            contexts.insert(context_id.into(), context);
        }
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ContextLookup for InMemoryContextStore {
    async fn get(
        &self,
        context_id: &str,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, StorageError> {
        let contexts = self
            .contexts
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(contexts.get(context_id).cloned())
    }
}
