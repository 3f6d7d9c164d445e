//! 适配器错误类型定义

/// 数据源适配器错误
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// 连接错误
    #[error("connection error: {0}")]
    Connection(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Modbus 错误
    #[error("modbus error: {0}")]
    Modbus(String),

    /// HTTP 错误
    #[error("http error: {0}")]
    Http(String),

    /// 协议驱动错误
    #[error("driver error: {0}")]
    Driver(String),

    /// 协议驱动未注入
    #[error("no driver registered for protocol: {0}")]
    DriverMissing(String),

    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// 配置与协议不匹配
    #[error("config mismatch: {0}")]
    ConfigMismatch(String),

    /// 配置已禁用
    #[error("source is disabled: {0}")]
    Disabled(String),

    /// 数据源名称重复
    #[error("duplicate source name: {0}")]
    DuplicateSource(String),

    /// 数据解析错误
    #[error("data parse error: {0}")]
    DataParse(String),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),

    /// 该数据源不支持写入
    #[error("write not supported by this source")]
    WriteUnsupported,
}
