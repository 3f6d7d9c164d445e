//! 路由装配

use crate::handlers;
use crate::state::AppState;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

/// 组装全部业务路由。
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trigger", post(handlers::trigger::trigger))
        .route(
            "/api/recommendations/pending",
            get(handlers::recommendations::list_pending),
        )
        .route(
            "/api/recommendations/history",
            get(handlers::recommendations::history),
        )
        .route(
            "/api/recommendations/expire",
            post(handlers::recommendations::expire),
        )
        .route(
            "/api/recommendations/:id",
            get(handlers::recommendations::get_one),
        )
        .route(
            "/api/recommendations/:id/approve",
            post(handlers::recommendations::approve),
        )
        .route(
            "/api/recommendations/:id/reject",
            post(handlers::recommendations::reject),
        )
        .route(
            "/api/recommendations/:id/execute",
            post(handlers::recommendations::execute),
        )
        .route("/api/discovery/scan", post(handlers::discovery::scan))
        .route("/api/discovery/test", post(handlers::discovery::test))
        .route("/metrics", get(handlers::metrics::snapshot))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use edge_adapter::{AdapterConfig, AdapterDeps};
    use edge_discovery::NetworkScanner;
    use edge_fusion::{FusionEngine, ThresholdScorer};
    use edge_pipeline::{NoopArtifactSink, PipelineService};
    use edge_recommend::RecommendationService;
    use edge_storage::{
        InMemoryAuditLogStore, InMemoryContextStore, InMemoryFeedbackQueueStore,
        InMemoryRecommendationStore, InMemoryRecordStore, InMemorySafetyLimitStore,
        SafetyLimitRecord, SafetyLimitStore,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_router(temperature: f64) -> Router {
        let engine = Arc::new(FusionEngine::new(
            AdapterDeps::default(),
            Arc::new(ThresholdScorer),
            500,
        ));
        let plc = AdapterConfig::from_json(&format!(
            r#"{{
                "source_name": "plc-sim",
                "category": "plc",
                "protocol": "mock",
                "field_mappings": {{
                    "kind": "mock",
                    "values": {{"temperature": {temperature}, "pressure": 101.0}}
                }}
            }}"#
        ))
        .unwrap();
        engine.initialize(vec![plc]).await.unwrap();

        let limits = Arc::new(InMemorySafetyLimitStore::new());
        limits
            .put(SafetyLimitRecord {
                device_id: "line1-press".to_string(),
                parameter_name: "temperature".to_string(),
                min_value: 60.0,
                max_value: 90.0,
                max_rate_of_change: None,
                requires_approval: true,
                enabled: true,
            })
            .await
            .unwrap();
        let audit = Arc::new(InMemoryAuditLogStore::new());
        let recommendations = Arc::new(RecommendationService::new(
            Arc::new(InMemoryRecommendationStore::new(audit.clone())),
            audit,
            limits,
            10,
        ));

        let context = Arc::new(InMemoryContextStore::new());
        let mut ctx = serde_json::Map::new();
        ctx.insert("work_order".to_string(), serde_json::json!("WO-12345"));
        context.put("ctx-1", ctx);

        let pipeline = Arc::new(PipelineService::new(
            engine,
            context,
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryFeedbackQueueStore::new()),
            recommendations.clone(),
            Arc::new(NoopArtifactSink),
            0.70,
        ));

        build_router(AppState {
            pipeline,
            recommendations,
            scanner: Arc::new(NetworkScanner::new(100)),
            adapter_deps: AdapterDeps::default(),
        })
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn trigger_with_unknown_context_returns_404() {
        let app = test_router(72.0).await;
        let response = app
            .oneshot(post_json(
                "/trigger",
                serde_json::json!({
                    "contextId": "ctx-missing",
                    "deviceId": "line1-press",
                    "triggerTsMs": 1_700_000_000_000i64
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "CONTEXT.NOT_FOUND");
    }

    #[tokio::test]
    async fn trigger_then_approve_flow() {
        let app = test_router(95.0).await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/trigger",
                serde_json::json!({
                    "contextId": "ctx-1",
                    "deviceId": "line1-press",
                    "triggerTsMs": 1_700_000_000_000i64
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["prediction"], "defective");
        let recommendation_id = body["data"]["recommendationIds"][0]
            .as_str()
            .unwrap()
            .to_string();

        // 待审批列表包含新建议
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/recommendations/pending?deviceId=line1-press")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        // 缺操作人头直接拒绝
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/recommendations/{}/approve", recommendation_id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut request = post_json(
            &format!("/api/recommendations/{}/approve", recommendation_id),
            serde_json::json!({"notes": "confirmed on floor"}),
        );
        request
            .headers_mut()
            .insert("x-operator-id", "operator-1".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["status"], "approved");
    }

    #[tokio::test]
    async fn invalid_scan_range_returns_400() {
        let app = test_router(72.0).await;
        let response = app
            .oneshot(post_json(
                "/api/discovery/scan",
                serde_json::json!({"cidr": "not-a-subnet"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "DISCOVERY.INVALID_RANGE");
    }
}
