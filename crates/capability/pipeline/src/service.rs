//! 触发流水线
//!
//! 一次触发事件的完整编排：上下文查询 → 多源采集 → 融合 → 打分 →
//! 落库（低置信度入反馈队列）→ 建议创建 → 响应构建。制品上送在
//! 响应构建之后转入后台任务，不占触发时延。

use crate::artifact::ArtifactSink;
use crate::error::PipelineError;
use domain::{Prediction, now_epoch_ms};
use edge_adapter::WriteKind;
use edge_fusion::{FusionEngine, fuse};
use edge_recommend::{RecommendationService, execution_status};
use edge_storage::{
    ContextLookup, FeedbackItemRecord, FeedbackQueueStore, LabeledRecord, RecommendationRecord,
    RecordStore, status,
};
use edge_telemetry::{
    record_artifact_upload_failure, record_artifact_upload_success, record_feedback_enqueued,
    record_fusion_cycle, record_pipeline_latency_ms,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 反馈队列高优先级阈值。
const HIGH_PRIORITY_CONFIDENCE: f64 = 0.60;

/// 触发命令。
#[derive(Debug, Clone)]
pub struct TriggerCommand {
    pub context_id: String,
    pub device_id: String,
    pub trigger_ts_ms: i64,
    pub artifact_ref: Option<String>,
}

/// 触发结果。
#[derive(Debug, Clone)]
pub struct TriggerOutcome {
    pub record_id: String,
    pub prediction: Prediction,
    pub recommendation_ids: Vec<String>,
}

/// 流水线编排服务。
pub struct PipelineService {
    engine: Arc<FusionEngine>,
    context: Arc<dyn ContextLookup>,
    records: Arc<dyn RecordStore>,
    feedback: Arc<dyn FeedbackQueueStore>,
    recommendations: Arc<RecommendationService>,
    artifact_sink: Arc<dyn ArtifactSink>,
    feedback_confidence_threshold: f64,
}

impl PipelineService {
    pub fn new(
        engine: Arc<FusionEngine>,
        context: Arc<dyn ContextLookup>,
        records: Arc<dyn RecordStore>,
        feedback: Arc<dyn FeedbackQueueStore>,
        recommendations: Arc<RecommendationService>,
        artifact_sink: Arc<dyn ArtifactSink>,
        feedback_confidence_threshold: f64,
    ) -> Self {
        Self {
            engine,
            context,
            records,
            feedback,
            recommendations,
            artifact_sink,
            feedback_confidence_threshold,
        }
    }

    pub fn recommendations(&self) -> &Arc<RecommendationService> {
        &self.recommendations
    }

    /// 处理一次触发事件。阶段 1-7 严格串行，制品上送在响应后异步执行。
    pub async fn handle_trigger(
        &self,
        command: TriggerCommand,
    ) -> Result<TriggerOutcome, PipelineError> {
        let started = Instant::now();

        // 1. 上下文查询，缺失即失败
        let context = self
            .context
            .get(&command.context_id)
            .await?
            .ok_or_else(|| PipelineError::ContextNotFound(command.context_id.clone()))?;

        // 2. 多源采集
        let sensor_data = self.engine.acquire(&command.device_id).await;
        record_fusion_cycle();

        // 3. 融合
        let fused = fuse(
            &command.context_id,
            &command.device_id,
            command.trigger_ts_ms,
            context,
            sensor_data,
            command.artifact_ref.clone(),
        );

        // 4. 打分
        let prediction = self.engine.score(&fused);

        // 5. 落库，低置信度额外入反馈队列
        let record_id = Uuid::new_v4().to_string();
        self.records
            .insert(LabeledRecord {
                record_id: record_id.clone(),
                fused: fused.clone(),
                prediction: prediction.clone(),
            })
            .await?;
        if prediction.confidence < self.feedback_confidence_threshold {
            let priority = if prediction.confidence < HIGH_PRIORITY_CONFIDENCE {
                "high"
            } else {
                "normal"
            };
            self.feedback
                .enqueue(FeedbackItemRecord {
                    feedback_id: Uuid::new_v4().to_string(),
                    record_id: record_id.clone(),
                    device_id: command.device_id.clone(),
                    predicted: prediction.result.clone(),
                    confidence: prediction.confidence,
                    priority: priority.to_string(),
                    created_at_ms: now_epoch_ms(),
                })
                .await?;
            record_feedback_enqueued();
            info!(
                target: "edge.pipeline",
                record_id,
                confidence = prediction.confidence,
                priority,
                "low-confidence prediction enqueued for labeling"
            );
        }

        // 6. 建议草稿经安全校验落为待审批建议
        let drafts = self.engine.derive_recommendations(&fused);
        let mut recommendation_ids = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let created = self
                .recommendations
                .create(&command.device_id, Some(&record_id), draft)
                .await?;
            recommendation_ids.push(created.recommendation_id);
        }

        // 7. 响应
        let outcome = TriggerOutcome {
            record_id: record_id.clone(),
            prediction: prediction.clone(),
            recommendation_ids,
        };

        // 8. 制品上送转后台，不阻塞响应
        if let Some(artifact_ref) = command.artifact_ref.clone() {
            let sink = self.artifact_sink.clone();
            let envelope = serde_json::json!({
                "record_id": record_id,
                "context_id": command.context_id,
                "device_id": command.device_id,
                "trigger_ts_ms": command.trigger_ts_ms,
                "predicted": prediction.result,
                "confidence": prediction.confidence,
            });
            tokio::spawn(async move {
                match sink.upload(&envelope, &artifact_ref).await {
                    Ok(()) => record_artifact_upload_success(),
                    Err(e) => {
                        record_artifact_upload_failure();
                        warn!(
                            target: "edge.pipeline",
                            artifact_ref,
                            error = %e,
                            "deferred artifact upload failed"
                        );
                    }
                }
            });
        }

        record_pipeline_latency_ms(started.elapsed().as_millis() as u64);
        info!(
            target: "edge.pipeline",
            record_id = outcome.record_id,
            device_id = command.device_id,
            predicted = outcome.prediction.result,
            recommendations = outcome.recommendation_ids.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "trigger handled"
        );
        Ok(outcome)
    }

    /// 执行一条已审批的建议：写 PLC，再按控制器结果回写状态。
    ///
    /// 写入前必须确认记录处于 approved：未审批的建议不许碰控制器。
    /// mark_executed 的条件更新是第二道保险，拦下检查与写入之间的
    /// 并发迁移。控制器侧是第三道安全闸：写失败或被拒都会如实落到
    /// execution_status，不回滚 approved 之前的任何状态。
    pub async fn execute_recommendation(
        &self,
        recommendation_id: &str,
    ) -> Result<RecommendationRecord, edge_recommend::RecommendError> {
        let record = self.recommendations.get(recommendation_id).await?;
        if record.status != status::APPROVED {
            warn!(
                target: "edge.pipeline",
                recommendation_id,
                status = record.status,
                "execution refused, recommendation is not approved"
            );
            return Err(edge_recommend::RecommendError::InvalidState(record.status));
        }
        let address = register_for_parameter(&record.target_parameter);

        let (status, response) = match self
            .engine
            .write_plc(address, record.recommended_value, WriteKind::Register)
            .await
        {
            Ok(true) => (execution_status::SUCCESS, "write acknowledged".to_string()),
            Ok(false) => (
                execution_status::CONTROLLER_REJECTED,
                "controller rejected write".to_string(),
            ),
            Err(e) => {
                error!(
                    target: "edge.pipeline",
                    recommendation_id,
                    error = %e,
                    "plc write failed"
                );
                (execution_status::FAILED, e.to_string())
            }
        };

        Ok(self
            .recommendations
            .mark_executed(recommendation_id, status, Some(response))
            .await?)
    }
}

/// 目标参数到保持寄存器地址的映射（后续应迁移到设备配置）。
fn register_for_parameter(parameter: &str) -> &'static str {
    match parameter {
        "temperature" => "40001",
        "speed" => "40002",
        "pressure" => "40003",
        "cycle_time" => "40004",
        _ => "40000",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_parameters_map_to_distinct_registers() {
        assert_eq!(register_for_parameter("temperature"), "40001");
        assert_eq!(register_for_parameter("pressure"), "40003");
        assert_eq!(register_for_parameter("unknown"), "40000");
    }
}
