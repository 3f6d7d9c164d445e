//! 触发流水线的集成测试

use async_trait::async_trait;
use domain::{FusedRecord, Prediction, now_epoch_ms};
use edge_adapter::{AdapterConfig, AdapterDeps, AdapterError, OpcUaDriver};
use edge_fusion::{FusionEngine, Scorer, ThresholdScorer};
use edge_pipeline::{
    ArtifactSink, NoopArtifactSink, PipelineError, PipelineService, TriggerCommand,
};
use edge_recommend::{RecommendError, RecommendationService};
use edge_storage::{
    FeedbackQueueStore, InMemoryAuditLogStore, InMemoryContextStore, InMemoryFeedbackQueueStore,
    InMemoryRecommendationStore, InMemoryRecordStore, InMemorySafetyLimitStore, RecordStore,
    SafetyLimitRecord, SafetyLimitStore, status,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;

fn mock_plc_config(temperature: f64) -> AdapterConfig {
    AdapterConfig::from_json(&format!(
        r#"{{
            "source_name": "plc-sim",
            "category": "plc",
            "protocol": "mock",
            "field_mappings": {{
                "kind": "mock",
                "values": {{
                    "temperature": {temperature},
                    "vibration": 2.1,
                    "pressure": 101.0,
                    "cycle_time": 19.5
                }}
            }}
        }}"#
    ))
    .unwrap()
}

struct Harness {
    records: Arc<InMemoryRecordStore>,
    feedback: Arc<InMemoryFeedbackQueueStore>,
    service: PipelineService,
}

async fn harness(
    temperature: f64,
    scorer: Arc<dyn Scorer>,
    artifact_sink: Arc<dyn ArtifactSink>,
) -> Harness {
    let engine = Arc::new(FusionEngine::new(AdapterDeps::default(), scorer, 500));
    engine
        .initialize(vec![mock_plc_config(temperature)])
        .await
        .unwrap();

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

    let records = Arc::new(InMemoryRecordStore::new());
    let feedback = Arc::new(InMemoryFeedbackQueueStore::new());
    let service = PipelineService::new(
        engine,
        context,
        records.clone(),
        feedback.clone(),
        recommendations,
        artifact_sink,
        0.70,
    );
    Harness {
        records,
        feedback,
        service,
    }
}

fn trigger(context_id: &str, artifact_ref: Option<&str>) -> TriggerCommand {
    TriggerCommand {
        context_id: context_id.to_string(),
        device_id: "line1-press".to_string(),
        trigger_ts_ms: now_epoch_ms(),
        artifact_ref: artifact_ref.map(str::to_string),
    }
}

#[tokio::test]
async fn context_miss_fails_without_persisting_anything() {
    let h = harness(72.0, Arc::new(ThresholdScorer), Arc::new(NoopArtifactSink)).await;
    let result = h.service.handle_trigger(trigger("ctx-missing", None)).await;
    assert!(matches!(result, Err(PipelineError::ContextNotFound(_))));
    assert!(h.records.find("any").await.unwrap().is_none());
    assert!(h.feedback.list(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn critical_temperature_trigger_yields_record_and_recommendation() {
    let h = harness(95.0, Arc::new(ThresholdScorer), Arc::new(NoopArtifactSink)).await;
    let outcome = h
        .service
        .handle_trigger(trigger("ctx-1", None))
        .await
        .unwrap();

    assert_eq!(outcome.prediction.result, "defective");
    assert_eq!(outcome.recommendation_ids.len(), 1);

    let stored = h.records.find(&outcome.record_id).await.unwrap().unwrap();
    assert_eq!(stored.fused.context_id, "ctx-1");
    assert_eq!(stored.fused.sensor_data.plc_field("temperature"), Some(95.0));
    // 置信度 0.80 不低于阈值，不入反馈队列
    assert!(h.feedback.list(10).await.unwrap().is_empty());
}

/// 固定低置信度的打分器，用于反馈队列分支。
struct LowConfidenceScorer(f64);

impl Scorer for LowConfidenceScorer {
    fn score(&self, _record: &FusedRecord) -> Prediction {
        Prediction::new("v0-test", "good", self.0, now_epoch_ms())
    }
}

#[tokio::test]
async fn low_confidence_prediction_enters_feedback_queue() {
    let h = harness(
        72.0,
        Arc::new(LowConfidenceScorer(0.55)),
        Arc::new(NoopArtifactSink),
    )
    .await;
    let outcome = h
        .service
        .handle_trigger(trigger("ctx-1", None))
        .await
        .unwrap();

    let items = h.feedback.list(10).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].record_id, outcome.record_id);
    assert_eq!(items[0].priority, "high");
}

/// 记录上送调用的接收端。
struct RecordingSink {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn upload(
        &self,
        _envelope: &serde_json::Value,
        artifact_ref: &str,
    ) -> Result<(), PipelineError> {
        let _ = self.tx.send(artifact_ref.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn artifact_upload_is_deferred_until_after_response() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let h = harness(
        72.0,
        Arc::new(ThresholdScorer),
        Arc::new(RecordingSink { tx }),
    )
    .await;

    let outcome = h
        .service
        .handle_trigger(trigger("ctx-1", Some("press-042.mp4")))
        .await
        .unwrap();
    assert!(!outcome.record_id.is_empty());

    // 响应已返回，上送在后台完成
    let uploaded = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
        .await
        .expect("upload should complete")
        .unwrap();
    assert_eq!(uploaded, "press-042.mp4");
}

/// 统计写入次数的 OPC UA 驱动。
struct CountingOpcUaDriver {
    writes: Arc<AtomicU32>,
}

#[async_trait]
impl OpcUaDriver for CountingOpcUaDriver {
    async fn connect(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn read_node(&self, _node_id: &str) -> Result<Vec<u8>, AdapterError> {
        Ok(42.5f32.to_be_bytes().to_vec())
    }

    async fn write_node(&self, _node_id: &str, _value: f64) -> Result<(), AdapterError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn unapproved_recommendation_never_reaches_the_controller() {
    let writes = Arc::new(AtomicU32::new(0));
    let deps = AdapterDeps {
        opcua: Some(Arc::new(CountingOpcUaDriver {
            writes: writes.clone(),
        })),
        ..Default::default()
    };
    let engine = Arc::new(FusionEngine::new(deps, Arc::new(ThresholdScorer), 500));
    let opcua = AdapterConfig::from_json(
        r#"{
            "source_name": "plc-opcua",
            "category": "plc",
            "protocol": "opcua",
            "field_mappings": {
                "kind": "opc_ua",
                "map": {"spindle_load": {"node_id": "ns=2;s=Load", "data_type": "float32"}}
            }
        }"#,
    )
    .unwrap();
    engine
        .initialize(vec![opcua, mock_plc_config(95.0)])
        .await
        .unwrap();

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
    context.put("ctx-1", serde_json::Map::new());
    let service = PipelineService::new(
        engine,
        context,
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(InMemoryFeedbackQueueStore::new()),
        recommendations,
        Arc::new(NoopArtifactSink),
        0.70,
    );

    let outcome = service.handle_trigger(trigger("ctx-1", None)).await.unwrap();
    let id = &outcome.recommendation_ids[0];

    // 未审批的建议拒绝执行，控制器一次写入都不许发生
    let refused = service.execute_recommendation(id).await;
    assert!(matches!(refused, Err(RecommendError::InvalidState(s)) if s == status::PENDING));
    assert_eq!(writes.load(Ordering::SeqCst), 0);

    let record = service.recommendations().get(id).await.unwrap();
    assert_eq!(record.status, status::PENDING);
    assert!(record.execution_status.is_none());

    // 审批后同一条建议正常写入
    service
        .recommendations()
        .approve(id, "operator-1", None)
        .await
        .unwrap();
    let executed = service.execute_recommendation(id).await.unwrap();
    assert_eq!(executed.status, status::EXECUTED);
    assert_eq!(executed.execution_status.as_deref(), Some("success"));
    assert_eq!(writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn execution_outcome_is_recorded_even_when_write_fails() {
    let h = harness(95.0, Arc::new(ThresholdScorer), Arc::new(NoopArtifactSink)).await;
    let outcome = h
        .service
        .handle_trigger(trigger("ctx-1", None))
        .await
        .unwrap();
    let id = &outcome.recommendation_ids[0];

    // 审批后执行；模拟 PLC 不支持写入，结果如实落库
    h.service
        .recommendations()
        .approve(id, "operator-1", None)
        .await
        .unwrap();
    let executed = h.service.execute_recommendation(id).await.unwrap();
    assert_eq!(executed.status, status::EXECUTED);
    assert_eq!(executed.execution_status.as_deref(), Some("failed"));
    assert!(executed.controller_response.is_some());
}
