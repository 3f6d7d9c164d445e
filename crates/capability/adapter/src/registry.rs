//! 适配器注册器
//!
//! 把配置映射到具体适配器构造函数，并在构建时拒绝：
//! - 已禁用的配置
//! - 类别与协议不匹配的配置
//! - 快照内重复的数据源名称
//! - 声明了驱动协议但未注入驱动的配置

use crate::driver::{EthernetIpAdapter, EthernetIpDriver, OpcUaAdapter, OpcUaDriver, S7Adapter, S7Driver};
use crate::error::AdapterError;
use crate::http_api::HttpApiAdapter;
use crate::mock::MockAdapter;
use crate::modbus::ModbusAdapter;
use crate::traits::DataSourceAdapter;
use crate::types::AdapterConfig;
use domain::SourceCategory;
use std::collections::HashSet;
use std::sync::Arc;

/// 适配器构造依赖：共享 HTTP 客户端与可注入的协议驱动。
#[derive(Clone, Default)]
pub struct AdapterDeps {
    pub http: reqwest::Client,
    pub opcua: Option<Arc<dyn OpcUaDriver>>,
    pub ethernet_ip: Option<Arc<dyn EthernetIpDriver>>,
    pub s7: Option<Arc<dyn S7Driver>>,
}

/// 业务类别只允许 http/mock 协议，PLC 类别只允许 PLC 协议。
fn check_category(config: &AdapterConfig) -> Result<(), AdapterError> {
    let plc_protocol = matches!(
        config.protocol.as_str(),
        "modbus_tcp" | "opcua" | "ethernet_ip" | "s7"
    );
    match config.category {
        SourceCategory::Plc if plc_protocol || config.protocol == "mock" => Ok(()),
        SourceCategory::Plc => Err(AdapterError::ConfigMismatch(format!(
            "source {}: protocol {} is not a plc protocol",
            config.source_name, config.protocol
        ))),
        _ if config.protocol == "http" || config.protocol == "mock" => Ok(()),
        _ => Err(AdapterError::ConfigMismatch(format!(
            "source {}: protocol {} is not valid for category {}",
            config.source_name, config.protocol, config.category
        ))),
    }
}

/// 根据配置构建单个适配器。
pub fn build_adapter(
    config: AdapterConfig,
    deps: &AdapterDeps,
) -> Result<Box<dyn DataSourceAdapter>, AdapterError> {
    if !config.enabled {
        return Err(AdapterError::Disabled(config.source_name));
    }
    check_category(&config)?;
    match config.protocol.as_str() {
        "modbus_tcp" => Ok(Box::new(ModbusAdapter::new(config)?)),
        "opcua" => {
            let driver = deps
                .opcua
                .clone()
                .ok_or_else(|| AdapterError::DriverMissing("opcua".to_string()))?;
            Ok(Box::new(OpcUaAdapter::new(config, driver)?))
        }
        "ethernet_ip" => {
            let driver = deps
                .ethernet_ip
                .clone()
                .ok_or_else(|| AdapterError::DriverMissing("ethernet_ip".to_string()))?;
            Ok(Box::new(EthernetIpAdapter::new(config, driver)?))
        }
        "s7" => {
            let driver = deps
                .s7
                .clone()
                .ok_or_else(|| AdapterError::DriverMissing("s7".to_string()))?;
            Ok(Box::new(S7Adapter::new(config, driver)?))
        }
        "http" => Ok(Box::new(HttpApiAdapter::new(config, deps.http.clone())?)),
        "mock" => Ok(Box::new(MockAdapter::new(config)?)),
        other => Err(AdapterError::ConfigParse(format!(
            "unknown protocol: {}",
            other
        ))),
    }
}

/// 构建一个配置快照的全部适配器，重复名称直接拒绝。
pub fn build_adapters(
    configs: Vec<AdapterConfig>,
    deps: &AdapterDeps,
) -> Result<Vec<Box<dyn DataSourceAdapter>>, AdapterError> {
    let mut seen = HashSet::new();
    let mut adapters = Vec::with_capacity(configs.len());
    for config in configs {
        if !seen.insert(config.source_name.clone()) {
            return Err(AdapterError::DuplicateSource(config.source_name));
        }
        adapters.push(build_adapter(config, deps)?);
    }
    Ok(adapters)
}
