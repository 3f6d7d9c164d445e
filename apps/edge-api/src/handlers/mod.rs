//! HTTP 处理器

pub mod discovery;
pub mod metrics;
pub mod recommendations;
pub mod trigger;
