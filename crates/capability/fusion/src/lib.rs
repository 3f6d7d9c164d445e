//! 多源融合能力
//!
//! 触发事件到来时，从全部在线数据源并发采集，合并为分类快照，
//! 组装融合记录，再经打分器与建议规则输出预测和建议草稿。
//! 数据源整体不可用时落兜底数据，保证流水线始终可走通。

pub mod engine;
pub mod error;
pub mod fallback;
pub mod rules;
pub mod scorer;

pub use engine::{AdapterSet, FusionEngine, LiveAdapter, fuse};
pub use error::FusionError;
pub use fallback::FallbackGenerator;
pub use rules::derive_recommendations;
pub use scorer::{Scorer, THRESHOLD_MODEL_VERSION, ThresholdScorer};
