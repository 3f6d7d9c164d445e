use api_contract::{ApiResponse, ScanRequest, TriggerRequest, TriggerResponse};

#[test]
fn success_envelope_shape() {
    let response = ApiResponse::success(TriggerResponse {
        status: "completed".to_string(),
        message: "pipeline finished".to_string(),
        record_id: "rec-1".to_string(),
        prediction: "good".to_string(),
        confidence: 0.92,
        recommendation_ids: vec![],
    });
    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["recordId"], "rec-1");
    assert!(json["error"].is_null());
}

#[test]
fn error_envelope_carries_code() {
    let response = ApiResponse::<()>::error(api_contract::codes::CONTEXT_NOT_FOUND, "no context");
    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "CONTEXT.NOT_FOUND");
}

#[test]
fn trigger_request_accepts_camel_case() {
    let request: TriggerRequest = serde_json::from_str(
        r#"{"contextId":"ctx-9","deviceId":"scanner-1","triggerTsMs":1700000000000}"#,
    )
    .expect("deserialize");
    assert_eq!(request.context_id, "ctx-9");
    assert!(request.artifact_ref.is_none());
}

#[test]
fn scan_request_protocols_default_empty() {
    let request: ScanRequest =
        serde_json::from_str(r#"{"cidr":"192.168.1.0/24"}"#).expect("deserialize");
    assert!(request.protocols.is_empty());
}
