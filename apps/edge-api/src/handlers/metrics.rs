//! 指标查询

use axum::Json;
use axum::response::IntoResponse;
use edge_telemetry::metrics;

/// GET /metrics：基础运行指标快照。
pub async fn snapshot() -> impl IntoResponse {
    let snapshot = metrics().snapshot();
    let avg_latency_ms = if snapshot.pipeline_latency_ms_count > 0 {
        snapshot.pipeline_latency_ms_total as f64 / snapshot.pipeline_latency_ms_count as f64
    } else {
        0.0
    };
    Json(serde_json::json!({
        "fusionCycles": snapshot.fusion_cycles,
        "adapterReadSuccess": snapshot.adapter_read_success,
        "adapterReadFailure": snapshot.adapter_read_failure,
        "mockFallbacks": snapshot.mock_fallbacks,
        "recommendationsCreated": snapshot.recommendations_created,
        "recommendationsApproved": snapshot.recommendations_approved,
        "recommendationsRejected": snapshot.recommendations_rejected,
        "recommendationsExecuted": snapshot.recommendations_executed,
        "recommendationsExpired": snapshot.recommendations_expired,
        "feedbackEnqueued": snapshot.feedback_enqueued,
        "discoveryProbes": snapshot.discovery_probes,
        "discoveryHits": snapshot.discovery_hits,
        "artifactUploadSuccess": snapshot.artifact_upload_success,
        "artifactUploadFailure": snapshot.artifact_upload_failure,
        "pipelineAvgLatencyMs": avg_latency_ms,
    }))
}
