//! 数据模型
//!
//! 定义所有存储相关的数据模型和更新结构：
//! - 建议模型：RecommendationRecord, RecommendationPatch
//! - 审计模型：AuditEntryRecord（仅追加）
//! - 安全限值模型：SafetyLimitRecord
//! - 融合记录模型：LabeledRecord
//! - 反馈队列模型：FeedbackItemRecord
//! - 适配器配置模型：AdapterConfigRecord

use domain::{FusedRecord, Prediction};

/// 建议状态常量。
///
/// 状态机：pending → approved | rejected | expired；approved → executed。
/// 所有迁移单向，由 `transition_status` 的条件更新保证。
pub mod status {
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const EXPIRED: &str = "expired";
    pub const EXECUTED: &str = "executed";
}

/// 审计动作常量。
pub mod audit_action {
    pub const CREATED: &str = "created";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const EXECUTED: &str = "executed";
    pub const EXPIRED: &str = "expired";
}

/// 建议记录。
#[derive(Debug, Clone)]
pub struct RecommendationRecord {
    pub recommendation_id: String,
    pub device_id: String,
    /// 产生该建议的融合记录
    pub source_record_id: Option<String>,
    pub action_type: String,
    pub target_parameter: String,
    pub current_value: Option<f64>,
    pub recommended_value: f64,
    pub unit: String,
    pub reasoning: String,
    pub confidence: f64,
    /// 数值越小越紧急
    pub priority: i32,
    pub status: String,
    /// 建议值是否落在安全限值区间内；限值缺失时为 false
    pub is_within_safe_limits: bool,
    pub safe_min: Option<f64>,
    pub safe_max: Option<f64>,
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
    pub approved_by: Option<String>,
    pub approved_at_ms: Option<i64>,
    pub notes: Option<String>,
    pub execution_status: Option<String>,
    pub executed_at_ms: Option<i64>,
    pub controller_response: Option<String>,
}

impl RecommendationRecord {
    /// 记录在给定时刻是否已过期（仅对 pending 有意义）。
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// 状态迁移时附带写入的字段（None 表示不修改）。
#[derive(Debug, Clone, Default)]
pub struct RecommendationPatch {
    pub approved_by: Option<String>,
    pub approved_at_ms: Option<i64>,
    pub notes: Option<String>,
    pub execution_status: Option<String>,
    pub executed_at_ms: Option<i64>,
    pub controller_response: Option<String>,
}

/// 审计条目（仅追加，不可更新）。
#[derive(Debug, Clone)]
pub struct AuditEntryRecord {
    pub audit_id: String,
    pub recommendation_id: String,
    pub action: String,
    pub performed_by: String,
    pub ts_ms: i64,
    /// 附加细节（JSON 文本）
    pub details: String,
}

/// 设备参数安全限值。
#[derive(Debug, Clone)]
pub struct SafetyLimitRecord {
    pub device_id: String,
    pub parameter_name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub max_rate_of_change: Option<f64>,
    pub requires_approval: bool,
    pub enabled: bool,
}

/// 落库的融合记录 + 打分结果。
#[derive(Debug, Clone)]
pub struct LabeledRecord {
    pub record_id: String,
    pub fused: FusedRecord,
    pub prediction: Prediction,
}

/// 低置信度样本的反馈队列条目。
#[derive(Debug, Clone)]
pub struct FeedbackItemRecord {
    pub feedback_id: String,
    pub record_id: String,
    pub device_id: String,
    pub predicted: String,
    pub confidence: f64,
    /// "high"（< 0.60）或 "normal"
    pub priority: String,
    pub created_at_ms: i64,
}

/// 适配器配置快照条目（config 字段为 AdapterConfig 的 JSON 文本）。
#[derive(Debug, Clone)]
pub struct AdapterConfigRecord {
    pub source_name: String,
    pub category: String,
    pub enabled: bool,
    pub config: String,
    pub updated_at_ms: i64,
}
