//! 触发流水线能力
//!
//! 编排一次触发事件的全流程，并承载过期清扫与配置热重载两个
//! 周期任务。上下文缺失是唯一对触发方致命的失败。

pub mod artifact;
pub mod error;
pub mod service;
pub mod tasks;

pub use artifact::{ArtifactSink, HttpArtifactSink, NoopArtifactSink};
pub use error::PipelineError;
pub use service::{PipelineService, TriggerCommand, TriggerOutcome};
pub use tasks::{load_adapter_configs, spawn_config_reloader, spawn_expiry_sweeper};
