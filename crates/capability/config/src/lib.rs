//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 存储后端选择。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// 进程内存储（本地运行与测试）
    Memory,
    /// PostgreSQL
    Postgres,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub store_backend: StoreBackend,
    /// store_backend 为 Postgres 时必填
    pub database_url: Option<String>,
    pub redis_url: String,
    /// 全部适配器使用模拟数据源（演示与离线开发）
    pub use_mock_sources: bool,
    pub recommendation_expiration_minutes: u64,
    pub expiry_sweep_seconds: u64,
    pub config_reload_seconds: u64,
    pub discovery_timeout_ms: u64,
    pub adapter_connect_timeout_ms: u64,
    pub adapter_read_timeout_ms: u64,
    pub adapter_max_connect_attempts: u32,
    pub adapter_backoff_base_ms: u64,
    /// 制品上传端点（为空则跳过上传）
    pub artifact_upload_url: Option<String>,
    /// 低于该置信度的预测进入反馈队列
    pub feedback_confidence_threshold: f64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr =
            env::var("EDGE_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let store_backend = read_store_backend("EDGE_STORE")?;
        let database_url = read_optional("EDGE_DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("EDGE_DATABASE_URL".to_string()));
        }
        let redis_url =
            env::var("EDGE_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let use_mock_sources = read_bool_with_default("EDGE_USE_MOCK_SOURCES", false);
        let recommendation_expiration_minutes =
            read_u64_with_default("EDGE_REC_EXPIRATION_MINUTES", 10)?;
        let expiry_sweep_seconds = read_u64_with_default("EDGE_EXPIRY_SWEEP_SECONDS", 30)?;
        let config_reload_seconds = read_u64_with_default("EDGE_CONFIG_RELOAD_SECONDS", 60)?;
        let discovery_timeout_ms = read_u64_with_default("EDGE_DISCOVERY_TIMEOUT_MS", 2000)?;
        let adapter_connect_timeout_ms =
            read_u64_with_default("EDGE_ADAPTER_CONNECT_TIMEOUT_MS", 5000)?;
        let adapter_read_timeout_ms = read_u64_with_default("EDGE_ADAPTER_READ_TIMEOUT_MS", 3000)?;
        let adapter_max_connect_attempts =
            read_u32_with_default("EDGE_ADAPTER_MAX_CONNECT_ATTEMPTS", 3)?;
        let adapter_backoff_base_ms =
            read_u64_with_default("EDGE_ADAPTER_BACKOFF_BASE_MS", 1000)?;
        let artifact_upload_url = read_optional("EDGE_ARTIFACT_UPLOAD_URL");
        let feedback_confidence_threshold =
            read_f64_with_default("EDGE_FEEDBACK_CONFIDENCE_THRESHOLD", 0.70)?;

        Ok(Self {
            http_addr,
            store_backend,
            database_url,
            redis_url,
            use_mock_sources,
            recommendation_expiration_minutes,
            expiry_sweep_seconds,
            config_reload_seconds,
            discovery_timeout_ms,
            adapter_connect_timeout_ms,
            adapter_read_timeout_ms,
            adapter_max_connect_attempts,
            adapter_backoff_base_ms,
            artifact_upload_url,
            feedback_confidence_threshold,
        })
    }
}

fn read_store_backend(key: &str) -> Result<StoreBackend, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" => Ok(StoreBackend::Postgres),
            _ => Err(ConfigError::Invalid(key.to_string(), value)),
        },
        Err(_) => Ok(StoreBackend::Memory),
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_f64_with_default(key: &str, default: f64) -> Result<f64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<f64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 只测缺省分支：并行测试下修改进程环境不可靠

    #[test]
    fn unset_keys_fall_back_to_defaults() {
        assert_eq!(read_u64_with_default("EDGE_TEST_UNSET_U64", 7).unwrap(), 7);
        assert_eq!(read_u32_with_default("EDGE_TEST_UNSET_U32", 3).unwrap(), 3);
        assert!(
            (read_f64_with_default("EDGE_TEST_UNSET_F64", 0.5).unwrap() - 0.5).abs() < f64::EPSILON
        );
        assert!(!read_bool_with_default("EDGE_TEST_UNSET_BOOL", false));
        assert!(read_bool_with_default("EDGE_TEST_UNSET_BOOL", true));
        assert!(read_optional("EDGE_TEST_UNSET_OPT").is_none());
    }

    #[test]
    fn store_backend_defaults_to_memory() {
        assert_eq!(
            read_store_backend("EDGE_TEST_UNSET_STORE").unwrap(),
            StoreBackend::Memory
        );
    }
}
