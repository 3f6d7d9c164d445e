//! Modbus TCP 适配器
//!
//! 按字段映射逐寄存器读取传感器数据：
//! - holding/input 寄存器读为数值，2 个寄存器按大端合并，再除以缩放系数
//! - coil/discrete 读为布尔
//! - 写入走 write_single_register / write_single_coil（安全门三的执行通道）

use crate::error::AdapterError;
use crate::traits::{ConnectBackoff, DataSourceAdapter, WriteKind};
use crate::types::{AdapterConfig, FieldMappings, ModbusFieldSpec, RegisterKind};
use async_trait::async_trait;
use domain::{FieldMap, FieldValue, SourceCategory, now_epoch_ms};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

/// Modbus TCP 数据源适配器
pub struct ModbusAdapter {
    config: AdapterConfig,
    map: BTreeMap<String, ModbusFieldSpec>,
    ctx: Option<tokio_modbus::client::Context>,
    connected: bool,
}

impl ModbusAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self, AdapterError> {
        let FieldMappings::Modbus { map } = config.field_mappings.clone() else {
            return Err(AdapterError::ConfigMismatch(format!(
                "source {} is modbus_tcp but field_mappings are not",
                config.source_name
            )));
        };
        Ok(Self {
            config,
            map,
            ctx: None,
            connected: false,
        })
    }

    fn socket_addr(&self) -> Result<SocketAddr, AdapterError> {
        let host = self
            .config
            .connection
            .host
            .as_deref()
            .ok_or_else(|| AdapterError::ConfigParse("missing host".to_string()))?;
        let port = self.config.connection.port.unwrap_or(502);
        format!("{}:{}", host, port)
            .parse()
            .map_err(|e| AdapterError::ConfigParse(format!("invalid address: {}", e)))
    }

    async fn try_connect_once(&mut self) -> bool {
        let addr = match self.socket_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!(target: "edge.adapter", source = %self.config.source_name, error = %e, "bad modbus address");
                return false;
            }
        };
        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        match timeout(connect_timeout, tcp::connect(addr)).await {
            Ok(Ok(mut ctx)) => {
                if let Some(unit_id) = self.config.connection.unit_id {
                    ctx.set_slave(Slave(unit_id));
                }
                info!(target: "edge.adapter", source = %self.config.source_name, %addr, "modbus connected");
                self.ctx = Some(ctx);
                true
            }
            Ok(Err(e)) => {
                warn!(target: "edge.adapter", source = %self.config.source_name, %addr, error = %e, "modbus connect failed");
                false
            }
            Err(_) => {
                warn!(target: "edge.adapter", source = %self.config.source_name, %addr, "modbus connect timed out");
                false
            }
        }
    }

    async fn read_field(&mut self, spec: &ModbusFieldSpec) -> Result<FieldValue, AdapterError> {
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| AdapterError::Connection("not connected".to_string()))?;
        let read_timeout = Duration::from_millis(self.config.read_timeout_ms);
        let value = match spec.kind {
            RegisterKind::Holding => {
                let registers = timeout(read_timeout, ctx.read_holding_registers(spec.address, spec.count))
                    .await
                    .map_err(|_| AdapterError::Timeout("holding register read".to_string()))?
                    .map_err(|e| AdapterError::Modbus(e.to_string()))?
                    .map_err(|e| AdapterError::Modbus(format!("exception: {:?}", e)))?;
                FieldValue::F64(scale_registers(&registers, spec.scale)?)
            }
            RegisterKind::Input => {
                let registers = timeout(read_timeout, ctx.read_input_registers(spec.address, spec.count))
                    .await
                    .map_err(|_| AdapterError::Timeout("input register read".to_string()))?
                    .map_err(|e| AdapterError::Modbus(e.to_string()))?
                    .map_err(|e| AdapterError::Modbus(format!("exception: {:?}", e)))?;
                FieldValue::F64(scale_registers(&registers, spec.scale)?)
            }
            RegisterKind::Coil => {
                let coils = timeout(read_timeout, ctx.read_coils(spec.address, 1))
                    .await
                    .map_err(|_| AdapterError::Timeout("coil read".to_string()))?
                    .map_err(|e| AdapterError::Modbus(e.to_string()))?
                    .map_err(|e| AdapterError::Modbus(format!("exception: {:?}", e)))?;
                FieldValue::Bool(coils.first().copied().unwrap_or(false))
            }
            RegisterKind::Discrete => {
                let inputs = timeout(read_timeout, ctx.read_discrete_inputs(spec.address, 1))
                    .await
                    .map_err(|_| AdapterError::Timeout("discrete input read".to_string()))?
                    .map_err(|e| AdapterError::Modbus(e.to_string()))?
                    .map_err(|e| AdapterError::Modbus(format!("exception: {:?}", e)))?;
                FieldValue::Bool(inputs.first().copied().unwrap_or(false))
            }
        };
        Ok(value)
    }
}

/// 合并寄存器并应用缩放除数。
fn scale_registers(registers: &[u16], scale: f64) -> Result<f64, AdapterError> {
    let raw = match registers {
        [single] => *single as u32,
        [high, low, ..] => ((*high as u32) << 16) | (*low as u32),
        [] => return Err(AdapterError::DataParse("empty registers".to_string())),
    };
    let divisor = if scale == 0.0 { 1.0 } else { scale };
    Ok(raw as f64 / divisor)
}

#[async_trait]
impl DataSourceAdapter for ModbusAdapter {
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
            if self.try_connect_once().await {
                self.connected = true;
                return true;
            }
            if !backoff.retry_after_failure(&source_name).await {
                return false;
            }
        }
    }

    async fn disconnect(&mut self) -> bool {
        self.ctx = None;
        self.connected = false;
        true
    }

    async fn read(&mut self, _identifier: &str) -> FieldMap {
        if !self.connected {
            warn!(target: "edge.adapter", source = %self.config.source_name, "modbus read while disconnected");
            return FieldMap::new();
        }
        let specs: Vec<(String, ModbusFieldSpec)> = self
            .map
            .iter()
            .map(|(name, spec)| (name.clone(), spec.clone()))
            .collect();
        let mut fields = FieldMap::new();
        for (name, spec) in specs {
            match self.read_field(&spec).await {
                Ok(value) => {
                    debug!(target: "edge.adapter", source = %self.config.source_name, field = %name, "modbus field read");
                    fields.insert(name, value);
                }
                Err(e) => {
                    warn!(
                        target: "edge.adapter",
                        source = %self.config.source_name,
                        field = %name,
                        address = spec.address,
                        error = %e,
                        "modbus field read failed"
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
        kind: WriteKind,
    ) -> Result<bool, AdapterError> {
        let register: u16 = address
            .parse()
            .map_err(|_| AdapterError::ConfigParse(format!("invalid register address: {}", address)))?;
        let write_timeout = Duration::from_millis(self.config.read_timeout_ms);
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| AdapterError::Connection("not connected".to_string()))?;
        match kind {
            WriteKind::Register => {
                timeout(write_timeout, ctx.write_single_register(register, value as u16))
                    .await
                    .map_err(|_| AdapterError::Timeout("register write".to_string()))?
                    .map_err(|e| AdapterError::Modbus(e.to_string()))?
                    .map_err(|e| AdapterError::Modbus(format!("exception: {:?}", e)))?;
            }
            WriteKind::Coil => {
                timeout(write_timeout, ctx.write_single_coil(register, value != 0.0))
                    .await
                    .map_err(|_| AdapterError::Timeout("coil write".to_string()))?
                    .map_err(|e| AdapterError::Modbus(e.to_string()))?
                    .map_err(|e| AdapterError::Modbus(format!("exception: {:?}", e)))?;
            }
        }
        info!(
            target: "edge.adapter",
            source = %self.config.source_name,
            register,
            value,
            "modbus write applied"
        );
        Ok(true)
    }

    fn health_check(&self) -> bool {
        self.connected
    }
}
