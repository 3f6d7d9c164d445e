//! 建议服务错误类型定义
//!
//! 状态机违规以类型化错误上抛，API 层据此映射为精确的错误码，
//! 操作端能看到明确的拒绝原因而不是笼统的失败。

use edge_storage::StorageError;

/// 建议服务错误。
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    /// 建议不存在
    #[error("recommendation not found")]
    NotFound,

    /// 当前状态不允许该迁移（携带当前状态）
    #[error("invalid state for transition: {0}")]
    InvalidState(String),

    /// 建议已过期
    #[error("recommendation expired")]
    Expired,

    /// 建议值不在安全限值区间内，不可审批通过
    #[error("recommended value is outside safe limits")]
    UnsafeValue,

    /// 存储层失败
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StorageError> for RecommendError {
    fn from(e: StorageError) -> Self {
        RecommendError::Storage(e.to_string())
    }
}
