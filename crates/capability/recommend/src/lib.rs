//! 建议生命周期能力
//!
//! 从规则草稿到执行回写的全流程：安全限值校验、人工审批闸、
//! 条件状态迁移、过期清扫与审计轨迹。

pub mod error;
pub mod service;

pub use error::RecommendError;
pub use service::{RecommendationService, execution_status};
