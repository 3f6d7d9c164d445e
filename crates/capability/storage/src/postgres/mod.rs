//! PostgreSQL 存储实现模块
//!
//! 生产环境使用。设计原则：
//! - 所有 SQL 使用参数绑定，禁止字符串拼接
//! - 时间戳统一以 epoch 毫秒出入，库内为 timestamptz
//! - 状态迁移用单条带状态条件的 UPDATE，并发下恰有一方生效
//!
//! 依赖的表：
//! - `recommendations`：建议（状态机主表）
//! - `recommendation_audit`：审计（仅追加）
//! - `safety_limits`：安全限值，(device_id, parameter_name) 主键
//! - `labeled_records`：融合记录 + 打分（JSONB）
//! - `feedback_queue`：低置信度反馈队列
//! - `adapter_configs`：适配器配置（JSONB），source_name 主键

pub mod adapter_config;
pub mod audit;
pub mod feedback;
pub mod record;
pub mod recommendation;
pub mod safety_limit;

pub use adapter_config::*;
pub use audit::*;
pub use feedback::*;
pub use record::*;
pub use recommendation::*;
pub use safety_limit::*;
