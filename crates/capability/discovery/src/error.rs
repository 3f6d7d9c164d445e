//! 发现服务错误类型定义

/// 发现服务错误。
///
/// 探测本身从不报错（超时/拒绝只是"这里没有设备"），
/// 错误只来自非法输入。
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// CIDR 网段格式非法
    #[error("invalid network range: {0}")]
    InvalidRange(String),

    /// 未知的协议过滤项
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
}
