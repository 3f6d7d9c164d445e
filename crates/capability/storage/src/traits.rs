//! 存储接口 Trait 定义
//!
//! 定义所有资源存储的异步接口：
//! - RecommendationStore：建议存储（含条件状态迁移）
//! - AuditLogStore：审计日志存储（仅追加）
//! - SafetyLimitStore：安全限值存储
//! - RecordStore：融合记录存储
//! - FeedbackQueueStore：反馈队列存储
//! - AdapterConfigStore：适配器配置存储
//! - ContextLookup：上下文查询（Redis / 内存）
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 状态迁移统一走 `transition_status` 条件更新，并发下恰有一方成功

use crate::error::StorageError;
use crate::models::{
    AdapterConfigRecord, AuditEntryRecord, FeedbackItemRecord, LabeledRecord, RecommendationPatch,
    RecommendationRecord, SafetyLimitRecord,
};
use async_trait::async_trait;

/// 建议存储接口。
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// 插入新建议
    async fn insert(&self, record: RecommendationRecord) -> Result<(), StorageError>;

    /// 按 ID 查找建议
    async fn find(&self, recommendation_id: &str)
    -> Result<Option<RecommendationRecord>, StorageError>;

    /// 条件状态迁移：仅当当前状态为 `from` 时迁移到 `to` 并应用补丁，
    /// 迁移成功时在同一事务里落审计条目，失败则一条都不写。
    ///
    /// 返回 true 表示本次调用完成了迁移；false 表示记录不存在或状态已变。
    async fn transition_status(
        &self,
        recommendation_id: &str,
        from: &str,
        to: &str,
        patch: RecommendationPatch,
        audit: AuditEntryRecord,
    ) -> Result<bool, StorageError>;

    /// 将所有 `expires_at <= now` 的 pending 建议置为 expired，返回条数。
    async fn expire_stale(&self, now_ms: i64) -> Result<u64, StorageError>;

    /// 列出未过期的 pending 建议，按 (priority asc, created_at asc) 排序。
    async fn list_pending(
        &self,
        device_id: Option<&str>,
        now_ms: i64,
    ) -> Result<Vec<RecommendationRecord>, StorageError>;

    /// 按设备列出历史建议（最新在前）。
    async fn history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, StorageError>;
}

/// 审计日志存储接口（仅追加）。
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// 追加审计条目
    async fn append(&self, record: AuditEntryRecord) -> Result<(), StorageError>;

    /// 列出某建议的全部审计条目（按时间正序）
    async fn list_for(
        &self,
        recommendation_id: &str,
    ) -> Result<Vec<AuditEntryRecord>, StorageError>;
}

/// 安全限值存储接口。
#[async_trait]
pub trait SafetyLimitStore: Send + Sync {
    /// 查找 (device_id, parameter_name) 的启用限值
    async fn find_enabled(
        &self,
        device_id: &str,
        parameter_name: &str,
    ) -> Result<Option<SafetyLimitRecord>, StorageError>;

    /// 插入或更新限值
    async fn put(&self, record: SafetyLimitRecord) -> Result<(), StorageError>;
}

/// 融合记录存储接口。
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 落库融合记录 + 打分结果
    async fn insert(&self, record: LabeledRecord) -> Result<(), StorageError>;

    /// 按 ID 查找记录
    async fn find(&self, record_id: &str) -> Result<Option<LabeledRecord>, StorageError>;
}

/// 反馈队列存储接口。
#[async_trait]
pub trait FeedbackQueueStore: Send + Sync {
    /// 入队低置信度样本
    async fn enqueue(&self, record: FeedbackItemRecord) -> Result<(), StorageError>;

    /// 列出队列条目（最新在前）
    async fn list(&self, limit: i64) -> Result<Vec<FeedbackItemRecord>, StorageError>;
}

/// 适配器配置存储接口。
#[async_trait]
pub trait AdapterConfigStore: Send + Sync {
    /// 列出全部启用的配置（按 source_name 排序，保证合并顺序可复现）
    async fn list_enabled(&self) -> Result<Vec<AdapterConfigRecord>, StorageError>;

    /// 插入或更新配置
    async fn upsert(&self, record: AdapterConfigRecord) -> Result<(), StorageError>;

    /// 配置快照版本号（最大 updated_at_ms，空表时为 0），热重载轮询用。
    async fn snapshot_version(&self) -> Result<i64, StorageError>;
}

/// 上下文查询接口。
///
/// 扫码得到的 context_id 换取上下文元数据；缺失对触发流程是致命的。
#[async_trait]
pub trait ContextLookup: Send + Sync {
    async fn get(
        &self,
        context_id: &str,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, StorageError>;
}
