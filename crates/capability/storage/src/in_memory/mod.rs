//! 内存存储实现模块
//!
//! 仅用于本地运行和测试。
//!
//! 包含以下实现：
//! - RecommendationStore: InMemoryRecommendationStore
//! - AuditLogStore: InMemoryAuditLogStore
//! - SafetyLimitStore: InMemorySafetyLimitStore
//! - RecordStore: InMemoryRecordStore
//! - FeedbackQueueStore: InMemoryFeedbackQueueStore
//! - AdapterConfigStore: InMemoryAdapterConfigStore
//! - ContextLookup: InMemoryContextStore

pub mod adapter_config;
pub mod audit;
pub mod context;
pub mod feedback;
pub mod record;
pub mod recommendation;
pub mod safety_limit;

pub use adapter_config::*;
pub use audit::*;
pub use context::*;
pub use feedback::*;
pub use record::*;
pub use recommendation::*;
pub use safety_limit::*;
