//! Mock 适配器
//!
//! 返回配置的固定字段值，总是连接成功。用于演示、连通性测试和
//! 离线开发（EDGE_USE_MOCK_SOURCES）。

use crate::error::AdapterError;
use crate::traits::DataSourceAdapter;
use crate::types::{AdapterConfig, FieldMappings};
use async_trait::async_trait;
use domain::{FieldMap, FieldValue, SourceCategory, now_epoch_ms};

/// Mock 数据源适配器
pub struct MockAdapter {
    config: AdapterConfig,
    values: FieldMap,
    connected: bool,
}

impl MockAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self, AdapterError> {
        let FieldMappings::Mock { values } = config.field_mappings.clone() else {
            return Err(AdapterError::ConfigMismatch(format!(
                "source {} is mock but field_mappings are not",
                config.source_name
            )));
        };
        Ok(Self {
            config,
            values,
            connected: false,
        })
    }
}

#[async_trait]
impl DataSourceAdapter for MockAdapter {
    fn source_name(&self) -> &str {
        &self.config.source_name
    }

    fn category(&self) -> SourceCategory {
        self.config.category
    }

    async fn connect(&mut self) -> bool {
        self.connected = true;
        true
    }

    async fn disconnect(&mut self) -> bool {
        self.connected = false;
        true
    }

    async fn read(&mut self, _identifier: &str) -> FieldMap {
        if !self.connected {
            return FieldMap::new();
        }
        let mut fields = self.values.clone();
        fields.insert("timestamp".to_string(), FieldValue::I64(now_epoch_ms()));
        fields
    }

    fn health_check(&self) -> bool {
        self.connected
    }
}
