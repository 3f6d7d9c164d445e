//! 网络扫描
//!
//! 对网段内每个 (主机 × 协议) 组合发起独立的 TCP 探测，JoinSet
//! 并发汇聚。探测失败（超时/拒绝/不可达）只表示该处无设备，
//! 从不让整次扫描失败。

use crate::cidr::expand_hosts;
use crate::error::DiscoveryError;
use domain::now_epoch_ms;
use edge_telemetry::{record_discovery_hit, record_discovery_probe};
use serde::Serialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// 可探测的协议。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanProtocol {
    ModbusTcp,
    Opcua,
    Http,
}

impl ScanProtocol {
    pub const ALL: [ScanProtocol; 3] = [
        ScanProtocol::ModbusTcp,
        ScanProtocol::Opcua,
        ScanProtocol::Http,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanProtocol::ModbusTcp => "modbus_tcp",
            ScanProtocol::Opcua => "opcua",
            ScanProtocol::Http => "http",
        }
    }

    pub fn parse(value: &str) -> Result<ScanProtocol, DiscoveryError> {
        match value {
            "modbus_tcp" | "modbus" => Ok(ScanProtocol::ModbusTcp),
            "opcua" => Ok(ScanProtocol::Opcua),
            "http" => Ok(ScanProtocol::Http),
            other => Err(DiscoveryError::UnknownProtocol(other.to_string())),
        }
    }
}

/// 各协议的探测端口（可覆盖，便于测试与非标部署）。
#[derive(Debug, Clone)]
pub struct ProbePorts {
    pub modbus: u16,
    pub opcua: u16,
    pub http: Vec<u16>,
}

impl Default for ProbePorts {
    fn default() -> Self {
        Self {
            modbus: 502,
            opcua: 4840,
            http: vec![80, 8080, 443, 8443],
        }
    }
}

/// 扫描发现的设备。
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    pub ip: String,
    pub port: u16,
    pub protocol: String,
    pub vendor: String,
    pub model: String,
    pub device_type: String,
    pub recommended_template: String,
    pub discovered_at_ms: i64,
}

/// 网络扫描器。
pub struct NetworkScanner {
    probe_timeout: Duration,
    ports: ProbePorts,
}

impl NetworkScanner {
    pub fn new(probe_timeout_ms: u64) -> Self {
        Self {
            probe_timeout: Duration::from_millis(probe_timeout_ms),
            ports: ProbePorts::default(),
        }
    }

    /// 覆盖默认探测端口（非标部署与测试用）。
    pub fn with_ports(mut self, ports: ProbePorts) -> Self {
        self.ports = ports;
        self
    }

    /// 扫描网段。`protocols` 为空时探测全部协议。
    ///
    /// 结果按 (ip, port) 排序，保证输出可复现。
    pub async fn scan_network(
        &self,
        cidr: &str,
        protocols: &[String],
    ) -> Result<Vec<DiscoveredDevice>, DiscoveryError> {
        let hosts = expand_hosts(cidr)?;
        let requested: Vec<ScanProtocol> = if protocols.is_empty() {
            ScanProtocol::ALL.to_vec()
        } else {
            protocols
                .iter()
                .map(|p| ScanProtocol::parse(p))
                .collect::<Result<_, _>>()?
        };
        info!(
            target: "edge.discovery",
            cidr,
            hosts = hosts.len(),
            protocols = ?requested.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            "starting network scan"
        );

        let mut join_set: JoinSet<Option<DiscoveredDevice>> = JoinSet::new();
        for host in hosts {
            for protocol in &requested {
                let protocol = *protocol;
                let ports = self.ports.clone();
                let probe_timeout = self.probe_timeout;
                join_set.spawn(async move {
                    probe_host(host, protocol, &ports, probe_timeout).await
                });
            }
        }

        let mut devices = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(device)) => {
                    record_discovery_hit();
                    devices.push(device);
                }
                Ok(None) => {}
                Err(e) => warn!(target: "edge.discovery", error = %e, "probe task panicked"),
            }
        }
        devices.sort_by(|a, b| a.ip.cmp(&b.ip).then(a.port.cmp(&b.port)));
        info!(
            target: "edge.discovery",
            found = devices.len(),
            "network scan complete"
        );
        Ok(devices)
    }
}

async fn probe_host(
    host: Ipv4Addr,
    protocol: ScanProtocol,
    ports: &ProbePorts,
    probe_timeout: Duration,
) -> Option<DiscoveredDevice> {
    match protocol {
        ScanProtocol::ModbusTcp => {
            if probe_port(host, ports.modbus, probe_timeout).await {
                return Some(describe_device(host, ports.modbus, protocol));
            }
            None
        }
        ScanProtocol::Opcua => {
            if probe_port(host, ports.opcua, probe_timeout).await {
                return Some(describe_device(host, ports.opcua, protocol));
            }
            None
        }
        ScanProtocol::Http => {
            // 首个开放端口即命中
            for port in &ports.http {
                if probe_port(host, *port, probe_timeout).await {
                    return Some(describe_device(host, *port, protocol));
                }
            }
            None
        }
    }
}

async fn probe_port(host: Ipv4Addr, port: u16, probe_timeout: Duration) -> bool {
    record_discovery_probe();
    let addr = SocketAddr::from((host, port));
    matches!(
        tokio::time::timeout(probe_timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

/// 根据协议给出厂商/型号的占位推断与推荐配置模板。
fn describe_device(host: Ipv4Addr, port: u16, protocol: ScanProtocol) -> DiscoveredDevice {
    let (model, device_type, template) = match protocol {
        ScanProtocol::ModbusTcp => ("Modbus TCP Device", "plc", "modbus_generic"),
        ScanProtocol::Opcua => ("OPC UA Server", "plc", "opcua_generic"),
        ScanProtocol::Http => ("HTTP Server", "mes", "http_generic"),
    };
    DiscoveredDevice {
        ip: host.to_string(),
        port,
        protocol: protocol.as_str().to_string(),
        vendor: "Unknown".to_string(),
        model: model.to_string(),
        device_type: device_type.to_string(),
        recommended_template: template.to_string(),
        discovered_at_ms: now_epoch_ms(),
    }
}
