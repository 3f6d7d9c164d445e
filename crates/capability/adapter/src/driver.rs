//! 驱动注入式 PLC 适配器（OPC UA / EtherNet-IP / S7）
//!
//! 线级编码不在本 crate 内实现：每种协议定义一个可注入的驱动接口，
//! 驱动返回原始字节，适配器按字段映射的 data_type 显式解码。
//! 生产部署注入真实驱动，测试注入内存驱动。

use crate::error::AdapterError;
use crate::traits::{ConnectBackoff, DataSourceAdapter, WriteKind};
use crate::types::{
    AdapterConfig, DecodedType, EipFieldSpec, FieldMappings, OpcUaFieldSpec, S7FieldSpec,
};
use async_trait::async_trait;
use domain::{FieldMap, FieldValue, SourceCategory, now_epoch_ms};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// OPC UA 驱动接口
#[async_trait]
pub trait OpcUaDriver: Send + Sync {
    async fn connect(&self) -> Result<(), AdapterError>;
    async fn disconnect(&self) -> Result<(), AdapterError>;
    /// 读取节点的原始字节（大端）
    async fn read_node(&self, node_id: &str) -> Result<Vec<u8>, AdapterError>;
    async fn write_node(&self, node_id: &str, value: f64) -> Result<(), AdapterError>;
}

/// EtherNet/IP 驱动接口
#[async_trait]
pub trait EthernetIpDriver: Send + Sync {
    async fn connect(&self) -> Result<(), AdapterError>;
    async fn disconnect(&self) -> Result<(), AdapterError>;
    async fn read_tag(&self, tag: &str) -> Result<Vec<u8>, AdapterError>;
    async fn write_tag(&self, tag: &str, value: f64) -> Result<(), AdapterError>;
}

/// S7 驱动接口
#[async_trait]
pub trait S7Driver: Send + Sync {
    async fn connect(&self) -> Result<(), AdapterError>;
    async fn disconnect(&self) -> Result<(), AdapterError>;
    async fn read_db(&self, db: u16, offset: u32, len: u16) -> Result<Vec<u8>, AdapterError>;
    async fn write_db(&self, db: u16, offset: u32, value: f64) -> Result<(), AdapterError>;
}

/// 按映射声明的类型解码驱动返回的原始字节（大端）。
pub fn decode_bytes(bytes: &[u8], data_type: DecodedType) -> Result<FieldValue, AdapterError> {
    let need = data_type.byte_len() as usize;
    if bytes.len() < need {
        return Err(AdapterError::DataParse(format!(
            "need {} bytes for {:?}, got {}",
            need,
            data_type,
            bytes.len()
        )));
    }
    let value = match data_type {
        DecodedType::Float32 => {
            let bits = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            FieldValue::F64(f32::from_bits(bits) as f64)
        }
        DecodedType::Int16 => {
            FieldValue::F64(i16::from_be_bytes([bytes[0], bytes[1]]) as f64)
        }
        DecodedType::Int32 => {
            let value = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            FieldValue::F64(value as f64)
        }
        DecodedType::Bool => FieldValue::Bool(bytes[0] != 0),
    };
    Ok(value)
}

/// OPC UA 适配器
pub struct OpcUaAdapter {
    config: AdapterConfig,
    map: BTreeMap<String, OpcUaFieldSpec>,
    driver: Arc<dyn OpcUaDriver>,
    connected: bool,
}

impl OpcUaAdapter {
    pub fn new(config: AdapterConfig, driver: Arc<dyn OpcUaDriver>) -> Result<Self, AdapterError> {
        let FieldMappings::OpcUa { map } = config.field_mappings.clone() else {
            return Err(AdapterError::ConfigMismatch(format!(
                "source {} is opcua but field_mappings are not",
                config.source_name
            )));
        };
        Ok(Self {
            config,
            map,
            driver,
            connected: false,
        })
    }
}

#[async_trait]
impl DataSourceAdapter for OpcUaAdapter {
    fn source_name(&self) -> &str {
        &self.config.source_name
    }

    fn category(&self) -> SourceCategory {
        self.config.category
    }

    async fn connect(&mut self) -> bool {
        if self.connected {
            return true;
        }
        let source_name = self.config.source_name.clone();
        let mut backoff =
            ConnectBackoff::new(self.config.max_connect_attempts, self.config.backoff_base_ms);
        loop {
            match self.driver.connect().await {
                Ok(()) => {
                    self.connected = true;
                    return true;
                }
                Err(e) => {
                    warn!(target: "edge.adapter", source = %source_name, error = %e, "opcua connect failed");
                }
            }
            if !backoff.retry_after_failure(&source_name).await {
                return false;
            }
        }
    }

    async fn disconnect(&mut self) -> bool {
        if self.connected {
            let _ = self.driver.disconnect().await;
        }
        self.connected = false;
        true
    }

    async fn read(&mut self, _identifier: &str) -> FieldMap {
        if !self.connected {
            return FieldMap::new();
        }
        let mut fields = FieldMap::new();
        for (name, spec) in &self.map {
            let decoded = match self.driver.read_node(&spec.node_id).await {
                Ok(bytes) => decode_bytes(&bytes, spec.data_type),
                Err(e) => Err(e),
            };
            match decoded {
                Ok(value) => {
                    fields.insert(name.clone(), value);
                }
                Err(e) => {
                    warn!(
                        target: "edge.adapter",
                        source = %self.config.source_name,
                        field = %name,
                        node = %spec.node_id,
                        error = %e,
                        "opcua field read failed"
                    );
                }
            }
        }
        if !fields.is_empty() {
            fields.insert("timestamp".to_string(), FieldValue::I64(now_epoch_ms()));
        }
        fields
    }

    async fn write(
        &mut self,
        address: &str,
        value: f64,
        _kind: WriteKind,
    ) -> Result<bool, AdapterError> {
        if !self.connected {
            return Err(AdapterError::Connection("not connected".to_string()));
        }
        self.driver.write_node(address, value).await?;
        Ok(true)
    }

    fn health_check(&self) -> bool {
        self.connected
    }
}

/// EtherNet/IP 适配器
pub struct EthernetIpAdapter {
    config: AdapterConfig,
    map: BTreeMap<String, EipFieldSpec>,
    driver: Arc<dyn EthernetIpDriver>,
    connected: bool,
}

impl EthernetIpAdapter {
    pub fn new(
        config: AdapterConfig,
        driver: Arc<dyn EthernetIpDriver>,
    ) -> Result<Self, AdapterError> {
        let FieldMappings::EthernetIp { map } = config.field_mappings.clone() else {
            return Err(AdapterError::ConfigMismatch(format!(
                "source {} is ethernet_ip but field_mappings are not",
                config.source_name
            )));
        };
        Ok(Self {
            config,
            map,
            driver,
            connected: false,
        })
    }
}

#[async_trait]
impl DataSourceAdapter for EthernetIpAdapter {
    fn source_name(&self) -> &str {
        &self.config.source_name
    }

    fn category(&self) -> SourceCategory {
        self.config.category
    }

    async fn connect(&mut self) -> bool {
        if self.connected {
            return true;
        }
        let source_name = self.config.source_name.clone();
        let mut backoff =
            ConnectBackoff::new(self.config.max_connect_attempts, self.config.backoff_base_ms);
        loop {
            if self.driver.connect().await.is_ok() {
                self.connected = true;
                return true;
            }
            if !backoff.retry_after_failure(&source_name).await {
                return false;
            }
        }
    }

    async fn disconnect(&mut self) -> bool {
        if self.connected {
            let _ = self.driver.disconnect().await;
        }
        self.connected = false;
        true
    }

    async fn read(&mut self, _identifier: &str) -> FieldMap {
        if !self.connected {
            return FieldMap::new();
        }
        let mut fields = FieldMap::new();
        for (name, spec) in &self.map {
            let decoded = match self.driver.read_tag(&spec.tag).await {
                Ok(bytes) => decode_bytes(&bytes, spec.data_type),
                Err(e) => Err(e),
            };
            match decoded {
                Ok(value) => {
                    fields.insert(name.clone(), value);
                }
                Err(e) => {
                    warn!(
                        target: "edge.adapter",
                        source = %self.config.source_name,
                        field = %name,
                        tag = %spec.tag,
                        error = %e,
                        "ethernet/ip field read failed"
                    );
                }
            }
        }
        if !fields.is_empty() {
            fields.insert("timestamp".to_string(), FieldValue::I64(now_epoch_ms()));
        }
        fields
    }

    async fn write(
        &mut self,
        address: &str,
        value: f64,
        _kind: WriteKind,
    ) -> Result<bool, AdapterError> {
        if !self.connected {
            return Err(AdapterError::Connection("not connected".to_string()));
        }
        self.driver.write_tag(address, value).await?;
        Ok(true)
    }

    fn health_check(&self) -> bool {
        self.connected
    }
}

/// S7 适配器
pub struct S7Adapter {
    config: AdapterConfig,
    map: BTreeMap<String, S7FieldSpec>,
    driver: Arc<dyn S7Driver>,
    connected: bool,
}

impl S7Adapter {
    pub fn new(config: AdapterConfig, driver: Arc<dyn S7Driver>) -> Result<Self, AdapterError> {
        let FieldMappings::S7 { map } = config.field_mappings.clone() else {
            return Err(AdapterError::ConfigMismatch(format!(
                "source {} is s7 but field_mappings are not",
                config.source_name
            )));
        };
        Ok(Self {
            config,
            map,
            driver,
            connected: false,
        })
    }
}

#[async_trait]
impl DataSourceAdapter for S7Adapter {
    fn source_name(&self) -> &str {
        &self.config.source_name
    }

    fn category(&self) -> SourceCategory {
        self.config.category
    }

    async fn connect(&mut self) -> bool {
        if self.connected {
            return true;
        }
        let source_name = self.config.source_name.clone();
        let mut backoff =
            ConnectBackoff::new(self.config.max_connect_attempts, self.config.backoff_base_ms);
        loop {
            if self.driver.connect().await.is_ok() {
                self.connected = true;
                return true;
            }
            if !backoff.retry_after_failure(&source_name).await {
                return false;
            }
        }
    }

    async fn disconnect(&mut self) -> bool {
        if self.connected {
            let _ = self.driver.disconnect().await;
        }
        self.connected = false;
        true
    }

    async fn read(&mut self, _identifier: &str) -> FieldMap {
        if !self.connected {
            return FieldMap::new();
        }
        let mut fields = FieldMap::new();
        for (name, spec) in &self.map {
            let decoded = match self
                .driver
                .read_db(spec.db, spec.offset, spec.data_type.byte_len())
                .await
            {
                Ok(bytes) => decode_bytes(&bytes, spec.data_type),
                Err(e) => Err(e),
            };
            match decoded {
                Ok(value) => {
                    fields.insert(name.clone(), value);
                }
                Err(e) => {
                    warn!(
                        target: "edge.adapter",
                        source = %self.config.source_name,
                        field = %name,
                        db = spec.db,
                        offset = spec.offset,
                        error = %e,
                        "s7 field read failed"
                    );
                }
            }
        }
        if !fields.is_empty() {
            fields.insert("timestamp".to_string(), FieldValue::I64(now_epoch_ms()));
        }
        fields
    }

    async fn write(
        &mut self,
        address: &str,
        value: f64,
        _kind: WriteKind,
    ) -> Result<bool, AdapterError> {
        if !self.connected {
            return Err(AdapterError::Connection("not connected".to_string()));
        }
        // 地址格式 "db:offset"
        let (db, offset) = address
            .split_once(':')
            .ok_or_else(|| AdapterError::ConfigParse(format!("invalid s7 address: {}", address)))?;
        let db: u16 = db
            .parse()
            .map_err(|_| AdapterError::ConfigParse(format!("invalid s7 db: {}", address)))?;
        let offset: u32 = offset
            .parse()
            .map_err(|_| AdapterError::ConfigParse(format!("invalid s7 offset: {}", address)))?;
        self.driver.write_db(db, offset, value).await?;
        Ok(true)
    }

    fn health_check(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_float32_big_endian() {
        let bytes = 95.5f32.to_be_bytes();
        let value = decode_bytes(&bytes, DecodedType::Float32).unwrap();
        assert_eq!(value.as_f64(), Some(95.5f32 as f64));
    }

    #[test]
    fn decode_int16_negative() {
        let bytes = (-42i16).to_be_bytes();
        let value = decode_bytes(&bytes, DecodedType::Int16).unwrap();
        assert_eq!(value.as_f64(), Some(-42.0));
    }

    #[test]
    fn decode_bool_nonzero() {
        assert_eq!(
            decode_bytes(&[1], DecodedType::Bool).unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            decode_bytes(&[0], DecodedType::Bool).unwrap(),
            FieldValue::Bool(false)
        );
    }

    #[test]
    fn short_buffer_rejected() {
        assert!(decode_bytes(&[0, 0], DecodedType::Float32).is_err());
    }
}
