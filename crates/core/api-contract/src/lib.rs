//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 触发请求体（扫码设备上报）。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    /// 扫码得到的上下文标识
    pub context_id: String,
    /// 触发设备标识
    pub device_id: String,
    /// 触发时间戳（毫秒）
    pub trigger_ts_ms: i64,
    /// 可选制品引用（如视频文件名）
    pub artifact_ref: Option<String>,
}

/// 触发响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status: String,
    pub message: String,
    pub record_id: String,
    pub prediction: String,
    pub confidence: f64,
    pub recommendation_ids: Vec<String>,
}

/// 建议审批请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub notes: Option<String>,
}

/// 建议驳回请求体（理由为审计必填项）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub reason: String,
}

/// 建议返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDto {
    pub recommendation_id: String,
    pub device_id: String,
    pub source_record_id: Option<String>,
    pub action_type: String,
    pub target_parameter: String,
    pub current_value: Option<f64>,
    pub recommended_value: f64,
    pub unit: String,
    pub reasoning: String,
    pub confidence: f64,
    pub priority: i32,
    pub status: String,
    pub is_within_safe_limits: bool,
    pub safe_min: Option<f64>,
    pub safe_max: Option<f64>,
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
    pub approved_by: Option<String>,
    pub approved_at_ms: Option<i64>,
    pub notes: Option<String>,
    pub execution_status: Option<String>,
}

/// 审批/驳回/执行操作的结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub recommendation_id: String,
    pub status: String,
}

/// 过期清扫结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireResponse {
    pub expired_count: u64,
}

/// 网段扫描请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// CIDR 网段，如 "192.168.1.0/24"
    pub cidr: String,
    /// 限定探测的协议（空表示全部）
    #[serde(default)]
    pub protocols: Vec<String>,
}

/// 已发现设备返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDeviceDto {
    pub ip: String,
    pub port: u16,
    pub protocol: String,
    pub vendor: String,
    pub model: String,
    pub device_type: String,
    pub recommended_template: String,
    pub discovered_at_ms: i64,
}

/// 连接测试请求体：候选设备 + 待验证配置。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionRequest {
    pub ip: String,
    pub port: u16,
    pub protocol: String,
    /// 候选适配器配置（JSON，与 AdapterConfig 同构）
    pub config: serde_json::Value,
}

/// 连接测试结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    pub sample_data: serde_json::Map<String, serde_json::Value>,
}

/// 统一错误码。
pub mod codes {
    pub const CONTEXT_NOT_FOUND: &str = "CONTEXT.NOT_FOUND";
    pub const FUSION_INTERNAL: &str = "FUSION.INTERNAL";
    pub const RECOMMEND_NOT_FOUND: &str = "RECOMMEND.NOT_FOUND";
    pub const RECOMMEND_INVALID_STATE: &str = "RECOMMEND.INVALID_STATE";
    pub const RECOMMEND_EXPIRED: &str = "RECOMMEND.EXPIRED";
    pub const RECOMMEND_UNSAFE_VALUE: &str = "RECOMMEND.UNSAFE_VALUE";
    pub const DISCOVERY_INVALID_RANGE: &str = "DISCOVERY.INVALID_RANGE";
    pub const BAD_REQUEST: &str = "REQUEST.INVALID";
    pub const INTERNAL: &str = "INTERNAL.ERROR";
}
