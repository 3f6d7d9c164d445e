//! Redis 上下文查询实现
//!
//! 上下文服务把扫码元数据写入 `context:{context_id}`，值为 JSON 文档。
//! 本实现只读，不回写。

use crate::error::StorageError;
use crate::traits::ContextLookup;
use redis::AsyncCommands;

fn context_key(context_id: &str) -> String {
    format!("context:{}", context_id)
}

/// Redis 上下文存储。
pub struct RedisContextStore {
    client: redis::Client,
}

impl RedisContextStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let client =
            redis::Client::open(redis_url).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait::async_trait]
impl ContextLookup for RedisContextStore {
    async fn get(
        &self,
        context_id: &str,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, StorageError> {
        let mut connection = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        let data: Option<String> = connection
            .get(context_key(context_id))
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        let Some(data) = data else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&data)?;
        match value {
            serde_json::Value::Object(map) => Ok(Some(map)),
            _ => Err(StorageError::new(format!(
                "context {} is not a JSON object",
                context_id
            ))),
        }
    }
}
