//! 设备发现 API

use crate::error::{bad_request, discovery_error};
use crate::state::AppState;
use api_contract::{
    ApiResponse, DiscoveredDeviceDto, ScanRequest, TestConnectionRequest, TestConnectionResponse,
};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use edge_adapter::AdapterConfig;
use edge_discovery::test_connection;

/// POST /api/discovery/scan：网段扫描。
pub async fn scan(State(state): State<AppState>, Json(req): Json<ScanRequest>) -> Response {
    match state.scanner.scan_network(&req.cidr, &req.protocols).await {
        Ok(devices) => {
            let dtos: Vec<DiscoveredDeviceDto> = devices
                .into_iter()
                .map(|d| DiscoveredDeviceDto {
                    ip: d.ip,
                    port: d.port,
                    protocol: d.protocol,
                    vendor: d.vendor,
                    model: d.model,
                    device_type: d.device_type,
                    recommended_template: d.recommended_template,
                    discovered_at_ms: d.discovered_at_ms,
                })
                .collect();
            (StatusCode::OK, Json(ApiResponse::success(dtos))).into_response()
        }
        Err(err) => discovery_error(err),
    }
}

/// POST /api/discovery/test：候选配置实连验证，不落库。
pub async fn test(
    State(state): State<AppState>,
    Json(req): Json<TestConnectionRequest>,
) -> Response {
    let mut config = match AdapterConfig::from_json(&req.config.to_string()) {
        Ok(config) => config,
        Err(err) => return bad_request(format!("invalid adapter config: {}", err)),
    };
    // 候选设备的地址覆盖配置里的占位
    config.protocol = req.protocol.clone();
    config.connection.host = Some(req.ip.clone());
    config.connection.port = Some(req.port);

    match test_connection(config, &state.adapter_deps, &req.ip).await {
        Ok(outcome) => {
            let sample_data = outcome
                .sample_data
                .iter()
                .filter_map(|(name, value)| {
                    serde_json::to_value(value)
                        .ok()
                        .map(|v| (name.clone(), v))
                })
                .collect();
            let response = TestConnectionResponse {
                success: outcome.success,
                message: outcome.message,
                sample_data,
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(err) => bad_request(err.to_string()),
    }
}
