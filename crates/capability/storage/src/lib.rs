//! # Edge Storage 模块
//!
//! 本模块提供统一的数据存储抽象层，支持多种存储后端实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：定义所有资源存储的异步 Trait 接口
//! 2. **数据模型层** (`models.rs`)：定义存储相关的数据结构
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和本地运行）
//!    - `postgres/`：PostgreSQL 存储实现（生产环境使用）
//!    - `redis.rs`：Redis 上下文查询实现
//!
//! ## 核心特性
//!
//! - **条件状态迁移**：建议状态机的每次迁移都是带当前状态条件的
//!   单次更新，并发调用下恰有一方成功
//! - **仅追加审计**：审计条目只增不改
//! - **类型安全**：使用 Rust 的类型系统和 sqlx 的参数化查询
//! - **异步支持**：基于 Tokio 的异步 I/O
//! - **可扩展性**：通过 Trait 接口支持多种存储后端

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod redis;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use redis::RedisContextStore;
pub use traits::*;

pub use in_memory::{
    InMemoryAdapterConfigStore, InMemoryAuditLogStore, InMemoryContextStore,
    InMemoryFeedbackQueueStore, InMemoryRecommendationStore, InMemoryRecordStore,
    InMemorySafetyLimitStore,
};

pub use postgres::{
    PgAdapterConfigStore, PgAuditLogStore, PgFeedbackQueueStore, PgRecommendationStore,
    PgRecordStore, PgSafetyLimitStore,
};
