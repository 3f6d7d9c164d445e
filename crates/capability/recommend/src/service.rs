//! 建议服务
//!
//! 建议的全生命周期管理：安全校验、创建、审批/驳回、执行回写、
//! 过期清扫。状态机 pending → {approved, rejected, expired}、
//! approved → executed，所有迁移单向，并发下靠存储层的条件更新
//! 保证恰有一方成功；审计条目随迁移由存储层原子落库。
//!
//! 三道安全闸：限值区间校验（创建时落 is_within_safe_limits）、
//! 人工审批（approve）、控制器侧校验（执行方回写 mark_executed）。

use crate::error::RecommendError;
use domain::{RecommendationDraft, now_epoch_ms};
use edge_storage::{
    AuditEntryRecord, AuditLogStore, RecommendationPatch, RecommendationRecord,
    RecommendationStore, SafetyLimitStore, audit_action, status,
};
use edge_telemetry::{
    record_recommendation_approved, record_recommendation_created, record_recommendation_executed,
    record_recommendation_rejected, record_recommendations_expired,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 执行结果常量（控制器侧的三种回写结果）。
pub mod execution_status {
    pub const SUCCESS: &str = "success";
    pub const FAILED: &str = "failed";
    pub const CONTROLLER_REJECTED: &str = "controller_rejected";
}

/// 建议服务。
pub struct RecommendationService {
    recommendations: Arc<dyn RecommendationStore>,
    audit: Arc<dyn AuditLogStore>,
    safety_limits: Arc<dyn SafetyLimitStore>,
    expiration_minutes: u64,
}

impl RecommendationService {
    pub fn new(
        recommendations: Arc<dyn RecommendationStore>,
        audit: Arc<dyn AuditLogStore>,
        safety_limits: Arc<dyn SafetyLimitStore>,
        expiration_minutes: u64,
    ) -> Self {
        Self {
            recommendations,
            audit,
            safety_limits,
            expiration_minutes,
        }
    }

    /// 从草稿创建建议。
    ///
    /// 限值缺失不是错误：照常创建，但 is_within_safe_limits 置 false
    /// 并在备注中说明（缺失的限值永远不按"在限值内"处理），这类
    /// 建议只能被驳回或过期。只有存储失败才上抛。
    pub async fn create(
        &self,
        device_id: &str,
        source_record_id: Option<&str>,
        draft: &RecommendationDraft,
    ) -> Result<RecommendationRecord, RecommendError> {
        let limit = self
            .safety_limits
            .find_enabled(device_id, &draft.target_parameter)
            .await?;

        let (is_within_safe_limits, safe_min, safe_max, notes) = match &limit {
            Some(limit) => (
                draft.recommended_value >= limit.min_value
                    && draft.recommended_value <= limit.max_value,
                Some(limit.min_value),
                Some(limit.max_value),
                None,
            ),
            None => {
                warn!(
                    target: "edge.recommend",
                    device_id,
                    parameter = draft.target_parameter,
                    "no safety limit configured, recommendation cannot be approved"
                );
                (
                    false,
                    None,
                    None,
                    Some("no safety limit configured; manual review is mandatory".to_string()),
                )
            }
        };

        let now = now_epoch_ms();
        let record = RecommendationRecord {
            recommendation_id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            source_record_id: source_record_id.map(str::to_string),
            action_type: draft.action_type.clone(),
            target_parameter: draft.target_parameter.clone(),
            current_value: draft.current_value,
            recommended_value: draft.recommended_value,
            unit: draft.unit.clone(),
            reasoning: draft.reasoning.clone(),
            confidence: draft.confidence,
            priority: draft.priority,
            status: status::PENDING.to_string(),
            is_within_safe_limits,
            safe_min,
            safe_max,
            created_at_ms: now,
            expires_at_ms: now + (self.expiration_minutes as i64) * 60_000,
            approved_by: None,
            approved_at_ms: None,
            notes,
            execution_status: None,
            executed_at_ms: None,
            controller_response: None,
        };

        self.recommendations.insert(record.clone()).await?;
        self.append_audit(
            &record.recommendation_id,
            audit_action::CREATED,
            "system",
            json!({
                "action_type": record.action_type,
                "target_parameter": record.target_parameter,
                "recommended_value": record.recommended_value,
                "is_within_safe_limits": record.is_within_safe_limits,
            }),
        )
        .await?;
        record_recommendation_created();
        info!(
            target: "edge.recommend",
            recommendation_id = record.recommendation_id,
            device_id,
            action = record.action_type,
            priority = record.priority,
            "recommendation created"
        );
        Ok(record)
    }

    /// 审批通过（安全闸 1：人工审批）。
    ///
    /// 过期的 pending 记录在报错前顺手迁移到 expired，不等下一轮清扫。
    pub async fn approve(
        &self,
        recommendation_id: &str,
        operator: &str,
        notes: Option<String>,
    ) -> Result<RecommendationRecord, RecommendError> {
        let record = self
            .recommendations
            .find(recommendation_id)
            .await?
            .ok_or(RecommendError::NotFound)?;
        if record.status != status::PENDING {
            return Err(RecommendError::InvalidState(record.status));
        }
        let now = now_epoch_ms();
        if record.is_expired_at(now) {
            let swept = self
                .recommendations
                .transition_status(
                    recommendation_id,
                    status::PENDING,
                    status::EXPIRED,
                    RecommendationPatch::default(),
                    audit_entry(
                        recommendation_id,
                        audit_action::EXPIRED,
                        "system",
                        json!({ "reason": "expired before approval" }),
                    ),
                )
                .await?;
            if swept {
                record_recommendations_expired(1);
            }
            return Err(RecommendError::Expired);
        }
        if !record.is_within_safe_limits {
            return Err(RecommendError::UnsafeValue);
        }

        let patch = RecommendationPatch {
            approved_by: Some(operator.to_string()),
            approved_at_ms: Some(now),
            notes: notes.clone(),
            ..Default::default()
        };
        let transitioned = self
            .recommendations
            .transition_status(
                recommendation_id,
                status::PENDING,
                status::APPROVED,
                patch,
                audit_entry(
                    recommendation_id,
                    audit_action::APPROVED,
                    operator,
                    json!({ "notes": notes }),
                ),
            )
            .await?;
        if !transitioned {
            // 并发迁移抢先，按当前状态报错
            return Err(RecommendError::InvalidState(
                self.current_status(recommendation_id).await?,
            ));
        }
        record_recommendation_approved();
        info!(
            target: "edge.recommend",
            recommendation_id,
            operator,
            "recommendation approved"
        );
        self.find_required(recommendation_id).await
    }

    /// 驳回。不做限值校验，过期的 pending 记录同样报 Expired。
    pub async fn reject(
        &self,
        recommendation_id: &str,
        operator: &str,
        reason: &str,
    ) -> Result<RecommendationRecord, RecommendError> {
        let record = self
            .recommendations
            .find(recommendation_id)
            .await?
            .ok_or(RecommendError::NotFound)?;
        if record.status != status::PENDING {
            return Err(RecommendError::InvalidState(record.status));
        }
        if record.is_expired_at(now_epoch_ms()) {
            return Err(RecommendError::Expired);
        }

        let patch = RecommendationPatch {
            notes: Some(reason.to_string()),
            ..Default::default()
        };
        let transitioned = self
            .recommendations
            .transition_status(
                recommendation_id,
                status::PENDING,
                status::REJECTED,
                patch,
                audit_entry(
                    recommendation_id,
                    audit_action::REJECTED,
                    operator,
                    json!({ "reason": reason }),
                ),
            )
            .await?;
        if !transitioned {
            return Err(RecommendError::InvalidState(
                self.current_status(recommendation_id).await?,
            ));
        }
        record_recommendation_rejected();
        info!(
            target: "edge.recommend",
            recommendation_id,
            operator,
            "recommendation rejected"
        );
        self.find_required(recommendation_id).await
    }

    /// 执行回写：approved → executed，记录控制器侧结果。
    pub async fn mark_executed(
        &self,
        recommendation_id: &str,
        execution_status: &str,
        controller_response: Option<String>,
    ) -> Result<RecommendationRecord, RecommendError> {
        let record = self
            .recommendations
            .find(recommendation_id)
            .await?
            .ok_or(RecommendError::NotFound)?;
        if record.status != status::APPROVED {
            return Err(RecommendError::InvalidState(record.status));
        }

        let patch = RecommendationPatch {
            execution_status: Some(execution_status.to_string()),
            executed_at_ms: Some(now_epoch_ms()),
            controller_response: controller_response.clone(),
            ..Default::default()
        };
        let transitioned = self
            .recommendations
            .transition_status(
                recommendation_id,
                status::APPROVED,
                status::EXECUTED,
                patch,
                audit_entry(
                    recommendation_id,
                    audit_action::EXECUTED,
                    "system",
                    json!({
                        "execution_status": execution_status,
                        "controller_response": controller_response,
                    }),
                ),
            )
            .await?;
        if !transitioned {
            return Err(RecommendError::InvalidState(
                self.current_status(recommendation_id).await?,
            ));
        }
        record_recommendation_executed();
        info!(
            target: "edge.recommend",
            recommendation_id,
            execution_status,
            "recommendation executed"
        );
        self.find_required(recommendation_id).await
    }

    /// 过期清扫：把所有到期的 pending 建议置为 expired，返回条数。
    /// 幂等，可与其他迁移并发。
    pub async fn expire_stale(&self) -> Result<u64, RecommendError> {
        let count = self.recommendations.expire_stale(now_epoch_ms()).await?;
        if count > 0 {
            record_recommendations_expired(count);
            info!(target: "edge.recommend", count, "stale recommendations expired");
        }
        Ok(count)
    }

    /// 未过期的 pending 建议，按 (priority asc, created_at asc) 排序。
    pub async fn list_pending(
        &self,
        device_id: Option<&str>,
    ) -> Result<Vec<RecommendationRecord>, RecommendError> {
        Ok(self
            .recommendations
            .list_pending(device_id, now_epoch_ms())
            .await?)
    }

    /// 某设备的历史建议（最新在前）。
    pub async fn history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, RecommendError> {
        Ok(self.recommendations.history(device_id, limit).await?)
    }

    pub async fn get(
        &self,
        recommendation_id: &str,
    ) -> Result<RecommendationRecord, RecommendError> {
        self.find_required(recommendation_id).await
    }

    /// 某建议的审计轨迹（按时间正序）。
    pub async fn audit_trail(
        &self,
        recommendation_id: &str,
    ) -> Result<Vec<AuditEntryRecord>, RecommendError> {
        Ok(self.audit.list_for(recommendation_id).await?)
    }

    async fn find_required(
        &self,
        recommendation_id: &str,
    ) -> Result<RecommendationRecord, RecommendError> {
        self.recommendations
            .find(recommendation_id)
            .await?
            .ok_or(RecommendError::NotFound)
    }

    async fn current_status(&self, recommendation_id: &str) -> Result<String, RecommendError> {
        Ok(self
            .recommendations
            .find(recommendation_id)
            .await?
            .map(|r| r.status)
            .unwrap_or_else(|| "unknown".to_string()))
    }

    async fn append_audit(
        &self,
        recommendation_id: &str,
        action: &str,
        performed_by: &str,
        details: serde_json::Value,
    ) -> Result<(), RecommendError> {
        self.audit
            .append(audit_entry(recommendation_id, action, performed_by, details))
            .await?;
        Ok(())
    }
}

/// 随状态迁移落库的审计条目。
fn audit_entry(
    recommendation_id: &str,
    action: &str,
    performed_by: &str,
    details: serde_json::Value,
) -> AuditEntryRecord {
    AuditEntryRecord {
        audit_id: Uuid::new_v4().to_string(),
        recommendation_id: recommendation_id.to_string(),
        action: action.to_string(),
        performed_by: performed_by.to_string(),
        ts_ms: now_epoch_ms(),
        details: details.to_string(),
    }
}
