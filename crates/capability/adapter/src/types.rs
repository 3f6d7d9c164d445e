//! 适配器配置类型
//!
//! 一个 `AdapterConfig` 描述一个外部数据源：类别、协议、连接参数、
//! 重试策略和字段映射。字段映射按协议分型（tagged enum），
//! 注册器负责拒绝协议与映射不匹配的配置。

use domain::FieldMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 数据源适配器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// 配置快照内唯一的数据源名称
    pub source_name: String,
    /// 数据源类别
    pub category: domain::SourceCategory,
    /// 协议标识：modbus_tcp / opcua / ethernet_ip / s7 / http / mock
    pub protocol: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub connection: ConnectionParams,
    /// 连接超时（毫秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// 读取超时（毫秒）
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// 连接重试上限
    #[serde(default = "default_max_connect_attempts")]
    pub max_connect_attempts: u32,
    /// 重试退避基数（毫秒，指数翻倍）
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    pub field_mappings: FieldMappings,
}

impl AdapterConfig {
    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, crate::error::AdapterError> {
        serde_json::from_str(json)
            .map_err(|e| crate::error::AdapterError::ConfigParse(e.to_string()))
    }
}

fn default_enabled() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    3000
}

fn default_max_connect_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

/// 连接参数（按协议取用需要的子集）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub unit_id: Option<u8>,
}

/// 字段映射（按协议分型）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldMappings {
    /// Modbus：字段名 → 寄存器规格
    Modbus { map: BTreeMap<String, ModbusFieldSpec> },
    /// OPC UA：字段名 → 节点规格
    OpcUa { map: BTreeMap<String, OpcUaFieldSpec> },
    /// EtherNet/IP：字段名 → 标签规格
    EthernetIp { map: BTreeMap<String, EipFieldSpec> },
    /// S7：字段名 → DB 块规格
    S7 { map: BTreeMap<String, S7FieldSpec> },
    /// HTTP 业务系统：端点 + 标签投影
    Http {
        #[serde(default)]
        data_endpoint: Option<String>,
        #[serde(default)]
        health_endpoint: Option<String>,
        /// SCADA 透传 / Historian 聚合的标签列表
        #[serde(default)]
        tags: Vec<String>,
        /// Historian 聚合时间窗口（分钟）
        #[serde(default)]
        time_window_minutes: Option<u64>,
    },
    /// Mock：固定字段值
    Mock { values: FieldMap },
}

/// Modbus 寄存器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    #[default]
    Holding,
    Input,
    Coil,
    Discrete,
}

/// Modbus 字段规格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusFieldSpec {
    pub address: u16,
    #[serde(default)]
    pub kind: RegisterKind,
    /// 寄存器数量（1 或 2，2 个寄存器按大端合并）
    #[serde(default = "default_register_count")]
    pub count: u16,
    /// 缩放除数（raw / scale）
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_register_count() -> u16 {
    1
}

fn default_scale() -> f64 {
    1.0
}

/// 驱动读出原始字节的解码类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodedType {
    Float32,
    Int16,
    Int32,
    Bool,
}

impl DecodedType {
    /// 解码所需字节数
    pub fn byte_len(&self) -> u16 {
        match self {
            DecodedType::Float32 | DecodedType::Int32 => 4,
            DecodedType::Int16 => 2,
            DecodedType::Bool => 1,
        }
    }
}

/// OPC UA 字段规格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpcUaFieldSpec {
    pub node_id: String,
    pub data_type: DecodedType,
}

/// EtherNet/IP 字段规格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EipFieldSpec {
    pub tag: String,
    pub data_type: DecodedType,
}

/// S7 字段规格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S7FieldSpec {
    pub db: u16,
    pub offset: u32,
    pub data_type: DecodedType,
}
