//! 数据源适配器层
//!
//! 把异构工业数据源规约到同一个异步契约之下：
//! - PLC：Modbus TCP（tokio-modbus）、OPC UA / EtherNet/IP / S7（驱动注入）
//! - 业务系统：MES / ERP / SCADA / Historian（HTTP）
//! - Mock：固定数据，本地与演示
//!
//! 失败隔离是本层的核心约定：connect/disconnect/read 从不向上抛错，
//! 读取失败表现为空 FieldMap，由融合引擎按源隔离处理。

pub mod driver;
pub mod error;
pub mod http_api;
pub mod mock;
pub mod modbus;
pub mod registry;
pub mod traits;
pub mod types;

pub use driver::{EthernetIpAdapter, EthernetIpDriver, OpcUaAdapter, OpcUaDriver, S7Adapter, S7Driver, decode_bytes};
pub use error::AdapterError;
pub use http_api::HttpApiAdapter;
pub use mock::MockAdapter;
pub use modbus::ModbusAdapter;
pub use registry::{AdapterDeps, build_adapter, build_adapters};
pub use traits::{ConnectBackoff, DataSourceAdapter, WriteKind};
pub use types::{
    AdapterConfig, ConnectionParams, DecodedType, EipFieldSpec, FieldMappings, ModbusFieldSpec,
    OpcUaFieldSpec, RegisterKind, S7FieldSpec,
};
