//! 触发入口

use crate::error::pipeline_error;
use crate::state::AppState;
use api_contract::{ApiResponse, TriggerRequest, TriggerResponse};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use edge_pipeline::TriggerCommand;

/// POST /trigger：扫码设备上报触发事件。
pub async fn trigger(State(state): State<AppState>, Json(req): Json<TriggerRequest>) -> Response {
    let command = TriggerCommand {
        context_id: req.context_id,
        device_id: req.device_id,
        trigger_ts_ms: req.trigger_ts_ms,
        artifact_ref: req.artifact_ref,
    };
    match state.pipeline.handle_trigger(command).await {
        Ok(outcome) => {
            let response = TriggerResponse {
                status: "ok".to_string(),
                message: "trigger processed".to_string(),
                record_id: outcome.record_id,
                prediction: outcome.prediction.result,
                confidence: outcome.prediction.confidence,
                recommendation_ids: outcome.recommendation_ids,
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(err) => pipeline_error(err),
    }
}
