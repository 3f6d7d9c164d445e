//! 建议审批 API

use crate::error::{bad_request, recommend_error};
use crate::state::AppState;
use api_contract::{
    ApiResponse, ApproveRequest, ExpireResponse, RecommendationDto, RejectRequest,
    TransitionResponse,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use edge_storage::RecommendationRecord;
use serde::Deserialize;

/// 操作人标识请求头。
const OPERATOR_HEADER: &str = "x-operator-id";

fn to_dto(record: RecommendationRecord) -> RecommendationDto {
    RecommendationDto {
        recommendation_id: record.recommendation_id,
        device_id: record.device_id,
        source_record_id: record.source_record_id,
        action_type: record.action_type,
        target_parameter: record.target_parameter,
        current_value: record.current_value,
        recommended_value: record.recommended_value,
        unit: record.unit,
        reasoning: record.reasoning,
        confidence: record.confidence,
        priority: record.priority,
        status: record.status,
        is_within_safe_limits: record.is_within_safe_limits,
        safe_min: record.safe_min,
        safe_max: record.safe_max,
        created_at_ms: record.created_at_ms,
        expires_at_ms: record.expires_at_ms,
        approved_by: record.approved_by,
        approved_at_ms: record.approved_at_ms,
        notes: record.notes,
        execution_status: record.execution_status,
    }
}

fn operator_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuery {
    pub device_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub device_id: String,
    pub limit: Option<i64>,
}

/// GET /api/recommendations/pending
pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Response {
    match state
        .recommendations
        .list_pending(query.device_id.as_deref())
        .await
    {
        Ok(records) => {
            let dtos: Vec<RecommendationDto> = records.into_iter().map(to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(dtos))).into_response()
        }
        Err(err) => recommend_error(err),
    }
}

/// GET /api/recommendations/history
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    match state
        .recommendations
        .history(&query.device_id, query.limit.unwrap_or(50))
        .await
    {
        Ok(records) => {
            let dtos: Vec<RecommendationDto> = records.into_iter().map(to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(dtos))).into_response()
        }
        Err(err) => recommend_error(err),
    }
}

/// GET /api/recommendations/:id
pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.recommendations.get(&id).await {
        Ok(record) => (StatusCode::OK, Json(ApiResponse::success(to_dto(record)))).into_response(),
        Err(err) => recommend_error(err),
    }
}

/// POST /api/recommendations/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ApproveRequest>,
) -> Response {
    let Some(operator) = operator_id(&headers) else {
        return bad_request("missing x-operator-id header");
    };
    match state.recommendations.approve(&id, &operator, req.notes).await {
        Ok(record) => transition_response(record),
        Err(err) => recommend_error(err),
    }
}

/// POST /api/recommendations/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<RejectRequest>,
) -> Response {
    let Some(operator) = operator_id(&headers) else {
        return bad_request("missing x-operator-id header");
    };
    if req.reason.trim().is_empty() {
        return bad_request("reject reason is required");
    }
    match state
        .recommendations
        .reject(&id, &operator, &req.reason)
        .await
    {
        Ok(record) => transition_response(record),
        Err(err) => recommend_error(err),
    }
}

/// POST /api/recommendations/:id/execute
pub async fn execute(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pipeline.execute_recommendation(&id).await {
        Ok(record) => transition_response(record),
        Err(err) => recommend_error(err),
    }
}

/// POST /api/recommendations/expire：手动触发一次过期清扫。
pub async fn expire(State(state): State<AppState>) -> Response {
    match state.recommendations.expire_stale().await {
        Ok(expired_count) => (
            StatusCode::OK,
            Json(ApiResponse::success(ExpireResponse { expired_count })),
        )
            .into_response(),
        Err(err) => recommend_error(err),
    }
}

fn transition_response(record: RecommendationRecord) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::success(TransitionResponse {
            recommendation_id: record.recommendation_id,
            status: record.status,
        })),
    )
        .into_response()
}
