//! 追踪与请求 ID 生成。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub fusion_cycles: u64,
    pub adapter_read_success: u64,
    pub adapter_read_failure: u64,
    pub mock_fallbacks: u64,
    pub recommendations_created: u64,
    pub recommendations_approved: u64,
    pub recommendations_rejected: u64,
    pub recommendations_executed: u64,
    pub recommendations_expired: u64,
    pub feedback_enqueued: u64,
    pub discovery_probes: u64,
    pub discovery_hits: u64,
    pub artifact_upload_success: u64,
    pub artifact_upload_failure: u64,
    pub pipeline_latency_ms_total: u64,
    pub pipeline_latency_ms_count: u64,
}

/// 基础指标。
pub struct TelemetryMetrics {
    fusion_cycles: AtomicU64,
    adapter_read_success: AtomicU64,
    adapter_read_failure: AtomicU64,
    mock_fallbacks: AtomicU64,
    recommendations_created: AtomicU64,
    recommendations_approved: AtomicU64,
    recommendations_rejected: AtomicU64,
    recommendations_executed: AtomicU64,
    recommendations_expired: AtomicU64,
    feedback_enqueued: AtomicU64,
    discovery_probes: AtomicU64,
    discovery_hits: AtomicU64,
    artifact_upload_success: AtomicU64,
    artifact_upload_failure: AtomicU64,
    pipeline_latency_ms_total: AtomicU64,
    pipeline_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            fusion_cycles: AtomicU64::new(0),
            adapter_read_success: AtomicU64::new(0),
            adapter_read_failure: AtomicU64::new(0),
            mock_fallbacks: AtomicU64::new(0),
            recommendations_created: AtomicU64::new(0),
            recommendations_approved: AtomicU64::new(0),
            recommendations_rejected: AtomicU64::new(0),
            recommendations_executed: AtomicU64::new(0),
            recommendations_expired: AtomicU64::new(0),
            feedback_enqueued: AtomicU64::new(0),
            discovery_probes: AtomicU64::new(0),
            discovery_hits: AtomicU64::new(0),
            artifact_upload_success: AtomicU64::new(0),
            artifact_upload_failure: AtomicU64::new(0),
            pipeline_latency_ms_total: AtomicU64::new(0),
            pipeline_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fusion_cycles: self.fusion_cycles.load(Ordering::Relaxed),
            adapter_read_success: self.adapter_read_success.load(Ordering::Relaxed),
            adapter_read_failure: self.adapter_read_failure.load(Ordering::Relaxed),
            mock_fallbacks: self.mock_fallbacks.load(Ordering::Relaxed),
            recommendations_created: self.recommendations_created.load(Ordering::Relaxed),
            recommendations_approved: self.recommendations_approved.load(Ordering::Relaxed),
            recommendations_rejected: self.recommendations_rejected.load(Ordering::Relaxed),
            recommendations_executed: self.recommendations_executed.load(Ordering::Relaxed),
            recommendations_expired: self.recommendations_expired.load(Ordering::Relaxed),
            feedback_enqueued: self.feedback_enqueued.load(Ordering::Relaxed),
            discovery_probes: self.discovery_probes.load(Ordering::Relaxed),
            discovery_hits: self.discovery_hits.load(Ordering::Relaxed),
            artifact_upload_success: self.artifact_upload_success.load(Ordering::Relaxed),
            artifact_upload_failure: self.artifact_upload_failure.load(Ordering::Relaxed),
            pipeline_latency_ms_total: self.pipeline_latency_ms_total.load(Ordering::Relaxed),
            pipeline_latency_ms_count: self.pipeline_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录一次融合流程执行。
pub fn record_fusion_cycle() {
    metrics().fusion_cycles.fetch_add(1, Ordering::Relaxed);
}

/// 记录适配器读取成功次数。
pub fn record_adapter_read_success() {
    metrics()
        .adapter_read_success
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录适配器读取失败次数。
pub fn record_adapter_read_failure() {
    metrics()
        .adapter_read_failure
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录兜底模拟数据触发次数（全部数据源为空时）。
pub fn record_mock_fallback() {
    metrics().mock_fallbacks.fetch_add(1, Ordering::Relaxed);
}

/// 记录建议创建次数。
pub fn record_recommendation_created() {
    metrics()
        .recommendations_created
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录建议批准次数。
pub fn record_recommendation_approved() {
    metrics()
        .recommendations_approved
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录建议驳回次数。
pub fn record_recommendation_rejected() {
    metrics()
        .recommendations_rejected
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录建议执行次数。
pub fn record_recommendation_executed() {
    metrics()
        .recommendations_executed
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录建议过期次数（清扫任务或惰性判定）。
pub fn record_recommendations_expired(count: u64) {
    metrics()
        .recommendations_expired
        .fetch_add(count, Ordering::Relaxed);
}

/// 记录低置信度样本入反馈队列次数。
pub fn record_feedback_enqueued() {
    metrics().feedback_enqueued.fetch_add(1, Ordering::Relaxed);
}

/// 记录发现扫描的端口探测次数。
pub fn record_discovery_probe() {
    metrics().discovery_probes.fetch_add(1, Ordering::Relaxed);
}

/// 记录发现扫描命中的设备数。
pub fn record_discovery_hit() {
    metrics().discovery_hits.fetch_add(1, Ordering::Relaxed);
}

/// 记录制品上传成功次数。
pub fn record_artifact_upload_success() {
    metrics()
        .artifact_upload_success
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录制品上传失败次数。
pub fn record_artifact_upload_failure() {
    metrics()
        .artifact_upload_failure
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录触发到响应的流水线耗时（毫秒）。
pub fn record_pipeline_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .pipeline_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .pipeline_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
