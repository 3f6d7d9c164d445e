//! 流水线错误类型定义

use edge_recommend::RecommendError;
use edge_storage::StorageError;

/// 流水线错误。
///
/// 上下文缺失是数据问题而不是瞬时故障，单独成项，
/// 触发方据此停止重试。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 上下文不存在（致命，不做兜底）
    #[error("context not found: {0}")]
    ContextNotFound(String),

    /// 内部失败（落库、建议创建等）
    #[error("pipeline internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for PipelineError {
    fn from(e: StorageError) -> Self {
        PipelineError::Internal(e.to_string())
    }
}

impl From<RecommendError> for PipelineError {
    fn from(e: RecommendError) -> Self {
        PipelineError::Internal(e.to_string())
    }
}
