//! 设备发现能力
//!
//! 网段扫描（Modbus TCP / OPC UA / HTTP 端口探测）与入网前的
//! 连接验证。探测失败是常态，不是错误。

pub mod cidr;
pub mod error;
pub mod probe;
pub mod scan;

pub use cidr::{MAX_HOSTS, expand_hosts};
pub use error::DiscoveryError;
pub use probe::{TestOutcome, test_connection};
pub use scan::{DiscoveredDevice, NetworkScanner, ProbePorts, ScanProtocol};
