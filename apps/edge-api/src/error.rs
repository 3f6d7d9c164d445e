//! 错误到 HTTP 响应的映射
//!
//! 状态机违规映射为可区分的错误码与 4xx 状态，操作端据此给出
//! 精确提示；内部失败统一 500。

use api_contract::{ApiResponse, codes};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use edge_discovery::DiscoveryError;
use edge_pipeline::PipelineError;
use edge_recommend::RecommendError;

pub fn recommend_error(err: RecommendError) -> Response {
    let (status, code) = match &err {
        RecommendError::NotFound => (StatusCode::NOT_FOUND, codes::RECOMMEND_NOT_FOUND),
        RecommendError::InvalidState(_) => (StatusCode::CONFLICT, codes::RECOMMEND_INVALID_STATE),
        RecommendError::Expired => (StatusCode::GONE, codes::RECOMMEND_EXPIRED),
        RecommendError::UnsafeValue => (StatusCode::CONFLICT, codes::RECOMMEND_UNSAFE_VALUE),
        RecommendError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL),
    };
    (status, Json(ApiResponse::<()>::error(code, err.to_string()))).into_response()
}

pub fn pipeline_error(err: PipelineError) -> Response {
    let (status, code) = match &err {
        PipelineError::ContextNotFound(_) => (StatusCode::NOT_FOUND, codes::CONTEXT_NOT_FOUND),
        PipelineError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, codes::FUSION_INTERNAL),
    };
    (status, Json(ApiResponse::<()>::error(code, err.to_string()))).into_response()
}

pub fn discovery_error(err: DiscoveryError) -> Response {
    let (status, code) = match &err {
        DiscoveryError::InvalidRange(_) => {
            (StatusCode::BAD_REQUEST, codes::DISCOVERY_INVALID_RANGE)
        }
        DiscoveryError::UnknownProtocol(_) => (StatusCode::BAD_REQUEST, codes::BAD_REQUEST),
    };
    (status, Json(ApiResponse::<()>::error(code, err.to_string()))).into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(codes::BAD_REQUEST, message)),
    )
        .into_response()
}
