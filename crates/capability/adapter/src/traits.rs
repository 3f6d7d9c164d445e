//! 数据源适配器契约
//!
//! 所有适配器实现同一个异步契约。连接/断开/读取都不向调用方抛错：
//! 失败以布尔值或空 FieldMap 表达，由融合引擎隔离。只有写入
//! （执行建议时的回写）返回 Result。

use crate::error::AdapterError;
use async_trait::async_trait;
use domain::{FieldMap, SourceCategory};
use std::time::Duration;
use tracing::warn;

/// PLC 写入目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// 保持寄存器（数值参数）
    Register,
    /// 线圈（开关量）
    Coil,
}

/// 数据源适配器契约。
///
/// 只要求 Send：实例始终放在引擎的 tokio Mutex 后面独占访问，
/// 协议客户端句柄（如 tokio-modbus Context）不必是 Sync。
#[async_trait]
pub trait DataSourceAdapter: Send {
    fn source_name(&self) -> &str;

    fn category(&self) -> SourceCategory;

    /// 建立连接。幂等；内部按指数退避重试到配置上限，返回最终状态。
    async fn connect(&mut self) -> bool;

    /// 断开连接。幂等，从不报错。
    async fn disconnect(&mut self) -> bool;

    /// 读取一批字段。任何失败都返回空 map；单字段失败记录日志后跳过。
    async fn read(&mut self, identifier: &str) -> FieldMap;

    /// 向控制器写入参数。只有 PLC 适配器覆写。
    async fn write(
        &mut self,
        _address: &str,
        _value: f64,
        _kind: WriteKind,
    ) -> Result<bool, AdapterError> {
        Err(AdapterError::WriteUnsupported)
    }

    /// 最近一次已知的连接状态，不做 I/O。
    fn health_check(&self) -> bool;
}

/// 指数退避的重试节奏。
///
/// 适配器的 connect 循环自己调用连接原语，每次失败后问一次
/// `retry_after_failure`：还有剩余尝试就告警、睡一个退避间隔并
/// 翻倍（1s、2s、4s…）返回 true；尝试耗尽则告警后返回 false。
pub struct ConnectBackoff {
    attempt: u32,
    max_attempts: u32,
    backoff_ms: u64,
}

impl ConnectBackoff {
    pub fn new(max_attempts: u32, backoff_base_ms: u64) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            backoff_ms: backoff_base_ms,
        }
    }

    /// 记一次失败。还能重试就退避等待并返回 true，否则返回 false。
    pub async fn retry_after_failure(&mut self, source_name: &str) -> bool {
        self.attempt += 1;
        if self.attempt < self.max_attempts {
            warn!(
                target: "edge.adapter",
                source = source_name,
                attempt = self.attempt,
                backoff_ms = self.backoff_ms,
                "connect attempt failed, backing off"
            );
            tokio::time::sleep(Duration::from_millis(self.backoff_ms)).await;
            self.backoff_ms = self.backoff_ms.saturating_mul(2);
            true
        } else {
            warn!(
                target: "edge.adapter",
                source = source_name,
                attempt = self.attempt,
                "connect attempts exhausted"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn backoff_permits_exactly_max_attempts() {
        let mut backoff = ConnectBackoff::new(3, 1);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if !backoff.retry_after_failure("test").await {
                break;
            }
        }
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn zero_attempts_is_clamped_to_one() {
        let mut backoff = ConnectBackoff::new(0, 1);
        assert!(!backoff.retry_after_failure("test").await);
    }
}
