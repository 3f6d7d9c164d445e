//! 内存存储实现的集成测试

use edge_storage::{
    AdapterConfigRecord, AdapterConfigStore, AuditEntryRecord, AuditLogStore, FeedbackItemRecord,
    FeedbackQueueStore, InMemoryAdapterConfigStore, InMemoryAuditLogStore,
    InMemoryFeedbackQueueStore, InMemoryRecommendationStore, InMemorySafetyLimitStore,
    RecommendationPatch, RecommendationRecord, RecommendationStore, SafetyLimitRecord,
    SafetyLimitStore, audit_action, status,
};
use std::sync::Arc;

fn audit_entry(recommendation_id: &str, action: &str, ts_ms: i64) -> AuditEntryRecord {
    AuditEntryRecord {
        audit_id: format!("audit-{action}-{ts_ms}"),
        recommendation_id: recommendation_id.to_string(),
        action: action.to_string(),
        performed_by: "op-7".to_string(),
        ts_ms,
        details: "{}".to_string(),
    }
}

fn sample_recommendation(id: &str, created_at_ms: i64, priority: i32) -> RecommendationRecord {
    RecommendationRecord {
        recommendation_id: id.to_string(),
        device_id: "line1-press".to_string(),
        source_record_id: Some("rec-1".to_string()),
        action_type: "adjust_temperature".to_string(),
        target_parameter: "temperature".to_string(),
        current_value: Some(95.0),
        recommended_value: 75.0,
        unit: "celsius".to_string(),
        reasoning: "temperature critical".to_string(),
        confidence: 0.9,
        priority,
        status: status::PENDING.to_string(),
        is_within_safe_limits: true,
        safe_min: Some(60.0),
        safe_max: Some(85.0),
        created_at_ms,
        expires_at_ms: created_at_ms + 600_000,
        approved_by: None,
        approved_at_ms: None,
        notes: None,
        execution_status: None,
        executed_at_ms: None,
        controller_response: None,
    }
}

#[tokio::test]
async fn transition_succeeds_only_from_expected_status() {
    let audit = Arc::new(InMemoryAuditLogStore::new());
    let store = InMemoryRecommendationStore::new(audit.clone());
    store.insert(sample_recommendation("r1", 1000, 1)).await.unwrap();

    let moved = store
        .transition_status(
            "r1",
            status::PENDING,
            status::APPROVED,
            RecommendationPatch {
                approved_by: Some("op-7".to_string()),
                approved_at_ms: Some(2000),
                ..Default::default()
            },
            audit_entry("r1", audit_action::APPROVED, 2000),
        )
        .await
        .unwrap();
    assert!(moved);

    // 第二次从 pending 出发的迁移必须失败，且不落审计条目
    let moved_again = store
        .transition_status(
            "r1",
            status::PENDING,
            status::REJECTED,
            RecommendationPatch::default(),
            audit_entry("r1", audit_action::REJECTED, 3000),
        )
        .await
        .unwrap();
    assert!(!moved_again);

    let record = store.find("r1").await.unwrap().unwrap();
    assert_eq!(record.status, status::APPROVED);
    assert_eq!(record.approved_by.as_deref(), Some("op-7"));

    let trail = audit.list_for("r1").await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, audit_action::APPROVED);
}

#[tokio::test]
async fn expire_stale_is_idempotent() {
    let store = InMemoryRecommendationStore::new(Arc::new(InMemoryAuditLogStore::new()));
    store.insert(sample_recommendation("r1", 1000, 1)).await.unwrap();
    store.insert(sample_recommendation("r2", 1000, 2)).await.unwrap();

    let first = store.expire_stale(1000 + 600_000).await.unwrap();
    assert_eq!(first, 2);
    let second = store.expire_stale(1000 + 600_000).await.unwrap();
    assert_eq!(second, 0);
}

#[tokio::test]
async fn list_pending_orders_by_priority_then_age() {
    let store = InMemoryRecommendationStore::new(Arc::new(InMemoryAuditLogStore::new()));
    store.insert(sample_recommendation("late-p1", 3000, 1)).await.unwrap();
    store.insert(sample_recommendation("early-p2", 1000, 2)).await.unwrap();
    store.insert(sample_recommendation("early-p1", 2000, 1)).await.unwrap();

    let pending = store.list_pending(None, 5000).await.unwrap();
    let ids: Vec<&str> = pending
        .iter()
        .map(|item| item.recommendation_id.as_str())
        .collect();
    assert_eq!(ids, vec!["early-p1", "late-p1", "early-p2"]);
}

#[tokio::test]
async fn list_pending_excludes_expired_rows() {
    let store = InMemoryRecommendationStore::new(Arc::new(InMemoryAuditLogStore::new()));
    store.insert(sample_recommendation("r1", 1000, 1)).await.unwrap();

    let now = 1000 + 600_000;
    let pending = store.list_pending(None, now).await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn safety_limit_lookup_ignores_disabled_rows() {
    let store = InMemorySafetyLimitStore::new();
    store
        .put(SafetyLimitRecord {
            device_id: "line1-press".to_string(),
            parameter_name: "temperature".to_string(),
            min_value: 60.0,
            max_value: 85.0,
            max_rate_of_change: None,
            requires_approval: true,
            enabled: false,
        })
        .await
        .unwrap();

    let found = store
        .find_enabled("line1-press", "temperature")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn adapter_config_snapshot_version_tracks_updates() {
    let store = InMemoryAdapterConfigStore::new();
    assert_eq!(store.snapshot_version().await.unwrap(), 0);

    store
        .upsert(AdapterConfigRecord {
            source_name: "plc-main".to_string(),
            category: "plc".to_string(),
            enabled: true,
            config: "{}".to_string(),
            updated_at_ms: 42,
        })
        .await
        .unwrap();
    assert_eq!(store.snapshot_version().await.unwrap(), 42);

    // 禁用的配置不出现在启用列表里，但仍推动版本号
    store
        .upsert(AdapterConfigRecord {
            source_name: "mes-main".to_string(),
            category: "mes".to_string(),
            enabled: false,
            config: "{}".to_string(),
            updated_at_ms: 99,
        })
        .await
        .unwrap();
    assert_eq!(store.snapshot_version().await.unwrap(), 99);
    let enabled = store.list_enabled().await.unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].source_name, "plc-main");
}

#[tokio::test]
async fn feedback_queue_lists_newest_first() {
    let store = InMemoryFeedbackQueueStore::new();
    for (id, ts) in [("f1", 100), ("f2", 300), ("f3", 200)] {
        store
            .enqueue(FeedbackItemRecord {
                feedback_id: id.to_string(),
                record_id: "rec-1".to_string(),
                device_id: "line1-press".to_string(),
                predicted: "defective".to_string(),
                confidence: 0.55,
                priority: "high".to_string(),
                created_at_ms: ts,
            })
            .await
            .unwrap();
    }
    let items = store.list(2).await.unwrap();
    let ids: Vec<&str> = items.iter().map(|item| item.feedback_id.as_str()).collect();
    assert_eq!(ids, vec!["f2", "f3"]);
}
