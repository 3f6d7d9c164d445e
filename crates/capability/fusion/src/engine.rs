//! 多源融合引擎
//!
//! 引擎持有一组在线适配器，按触发事件并发采集、按快照顺序合并，
//! 再交给打分器与建议规则。适配器集合通过 `RwLock<Arc<AdapterSet>>`
//! 原子热换：采集路径克隆当前快照后不再持读锁，重载不会阻塞采集。

use crate::error::FusionError;
use crate::fallback::FallbackGenerator;
use crate::rules;
use crate::scorer::Scorer;
use domain::{
    CategorizedData, FUSION_VERSION, FieldMap, FusedRecord, Prediction, RecommendationDraft,
    SourceCategory, now_epoch_ms,
};
use edge_adapter::{AdapterConfig, AdapterDeps, DataSourceAdapter, WriteKind, build_adapters};
use edge_telemetry::{record_adapter_read_failure, record_adapter_read_success, record_mock_fallback};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// 在线适配器：适配器实例加运行时状态。
///
/// name/category 在构建时缓存，读取路径不必拿互斥锁。
pub struct LiveAdapter {
    source_name: String,
    category: SourceCategory,
    adapter: Mutex<Box<dyn DataSourceAdapter>>,
    error_count: AtomicU64,
    last_read_ts_ms: AtomicI64,
}

impl LiveAdapter {
    fn new(adapter: Box<dyn DataSourceAdapter>) -> Self {
        Self {
            source_name: adapter.source_name().to_string(),
            category: adapter.category(),
            adapter: Mutex::new(adapter),
            error_count: AtomicU64::new(0),
            last_read_ts_ms: AtomicI64::new(0),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn category(&self) -> SourceCategory {
        self.category
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn last_read_ts_ms(&self) -> i64 {
        self.last_read_ts_ms.load(Ordering::Relaxed)
    }

    pub async fn health_check(&self) -> bool {
        self.adapter.lock().await.health_check()
    }
}

/// 适配器集合快照。构建后不可变，整体替换。
#[derive(Default)]
pub struct AdapterSet {
    adapters: Vec<Arc<LiveAdapter>>,
}

impl AdapterSet {
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn adapters(&self) -> &[Arc<LiveAdapter>] {
        &self.adapters
    }
}

/// 多源融合引擎。
pub struct FusionEngine {
    deps: AdapterDeps,
    adapters: RwLock<Arc<AdapterSet>>,
    scorer: Arc<dyn Scorer>,
    fallback: FallbackGenerator,
    read_timeout: Duration,
}

impl FusionEngine {
    pub fn new(deps: AdapterDeps, scorer: Arc<dyn Scorer>, read_timeout_ms: u64) -> Self {
        Self {
            deps,
            adapters: RwLock::new(Arc::new(AdapterSet::default())),
            scorer,
            fallback: FallbackGenerator::new(),
            read_timeout: Duration::from_millis(read_timeout_ms),
        }
    }

    /// 测试用：注入可复现的兜底生成器。
    pub fn with_fallback(mut self, fallback: FallbackGenerator) -> Self {
        self.fallback = fallback;
        self
    }

    /// 首次装载适配器集合。
    pub async fn initialize(&self, configs: Vec<AdapterConfig>) -> Result<(), FusionError> {
        self.reload(configs).await
    }

    /// 按新配置重建适配器集合并原子热换。
    ///
    /// 连接失败的适配器仍保留在集合中，后续采集周期会先重连再读。
    /// 旧集合换出后等在途采集释放快照再统一断开，等待有上限。
    pub async fn reload(&self, configs: Vec<AdapterConfig>) -> Result<(), FusionError> {
        let built = build_adapters(configs, &self.deps)?;
        let mut adapters = Vec::with_capacity(built.len());
        for mut adapter in built {
            let connected = adapter.connect().await;
            if !connected {
                warn!(
                    target: "edge.fusion",
                    source = adapter.source_name(),
                    "adapter failed to connect, keeping in set"
                );
            }
            adapters.push(Arc::new(LiveAdapter::new(adapter)));
        }
        info!(target: "edge.fusion", count = adapters.len(), "adapter set loaded");

        let new_set = Arc::new(AdapterSet { adapters });
        let old_set = {
            let mut guard = self.adapters.write().await;
            std::mem::replace(&mut *guard, new_set)
        };
        // 在途 acquire 持有旧快照的 Arc；等引用回落到本函数这一份
        // 再断开，避免把正在读的周期打成空读。最多等 DRAIN_TICKS 轮。
        for _ in 0..Self::DRAIN_TICKS {
            if Arc::strong_count(&old_set) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        if Arc::strong_count(&old_set) > 1 {
            warn!(
                target: "edge.fusion",
                "old adapter set still referenced after drain window, disconnecting anyway"
            );
        }
        Self::disconnect_set(&old_set).await;
        Ok(())
    }

    const DRAIN_TICKS: u32 = 50;

    /// 断开全部适配器（停机路径）。
    pub async fn shutdown(&self) {
        let set = self.adapters.read().await.clone();
        Self::disconnect_set(&set).await;
        info!(target: "edge.fusion", "fusion engine shut down");
    }

    async fn disconnect_set(set: &AdapterSet) {
        for live in set.adapters() {
            live.adapter.lock().await.disconnect().await;
        }
    }

    /// 当前适配器集合快照（健康查询接口使用）。
    pub async fn snapshot(&self) -> Arc<AdapterSet> {
        self.adapters.read().await.clone()
    }

    /// 并发采集所有数据源并按快照顺序合并。
    ///
    /// 每个适配器一个任务，整体受读取超时约束；断开的源先尝试
    /// 重连，超时或失败按空读处理。合并按快照中的适配器顺序而非
    /// 完成顺序，保证同键覆盖行为可复现。全部为空时落兜底数据。
    pub async fn acquire(&self, device_id: &str) -> CategorizedData {
        let set = self.adapters.read().await.clone();
        let mut join_set: JoinSet<(usize, FieldMap)> = JoinSet::new();
        for (index, live) in set.adapters().iter().enumerate() {
            let live = live.clone();
            let device_id = device_id.to_string();
            let read_timeout = self.read_timeout;
            join_set.spawn(async move {
                let mut guard = live.adapter.lock().await;
                // 断开的源先试一次重连再读；整段受读取超时约束，
                // 超时会把退避等待一并截断，等价于单次尝试
                let fields = tokio::time::timeout(read_timeout, async {
                    if !guard.health_check() {
                        guard.connect().await;
                    }
                    guard.read(&device_id).await
                })
                .await
                .unwrap_or_default();
                drop(guard);
                if fields.is_empty() {
                    live.error_count.fetch_add(1, Ordering::Relaxed);
                    record_adapter_read_failure();
                } else {
                    live.last_read_ts_ms.store(now_epoch_ms(), Ordering::Relaxed);
                    record_adapter_read_success();
                }
                (index, fields)
            });
        }

        let mut slots: Vec<Option<FieldMap>> = vec![None; set.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, fields)) => slots[index] = Some(fields),
                Err(e) => warn!(target: "edge.fusion", error = %e, "adapter read task panicked"),
            }
        }

        let mut data = CategorizedData::new();
        for (index, slot) in slots.into_iter().enumerate() {
            if let Some(fields) = slot {
                data.merge_into(set.adapters()[index].category(), fields);
            }
        }

        if data.is_all_empty() {
            warn!(
                target: "edge.fusion",
                device_id,
                "all sources returned empty, generating fallback data"
            );
            record_mock_fallback();
            return self.fallback.generate();
        }
        data
    }

    /// 打分。
    pub fn score(&self, record: &FusedRecord) -> Prediction {
        self.scorer.score(record)
    }

    /// 评估建议规则。
    pub fn derive_recommendations(&self, record: &FusedRecord) -> Vec<RecommendationDraft> {
        rules::derive_recommendations(record)
    }

    /// 向第一个健康的 PLC 适配器写入参数。
    pub async fn write_plc(
        &self,
        address: &str,
        value: f64,
        kind: WriteKind,
    ) -> Result<bool, edge_adapter::AdapterError> {
        let set = self.adapters.read().await.clone();
        for live in set.adapters() {
            if live.category() != SourceCategory::Plc {
                continue;
            }
            let mut guard = live.adapter.lock().await;
            if !guard.health_check() {
                continue;
            }
            return guard.write(address, value, kind).await;
        }
        Err(edge_adapter::AdapterError::Connection(
            "no healthy plc adapter available".to_string(),
        ))
    }
}

/// 组装融合记录。纯函数，构建后记录不可变。
pub fn fuse(
    context_id: &str,
    device_id: &str,
    trigger_ts_ms: i64,
    context: serde_json::Map<String, serde_json::Value>,
    sensor_data: CategorizedData,
    artifact_ref: Option<String>,
) -> FusedRecord {
    FusedRecord {
        context_id: context_id.to_string(),
        device_id: device_id.to_string(),
        trigger_ts_ms,
        context,
        sensor_data,
        artifact_ref,
        fusion_ts_ms: now_epoch_ms(),
        fusion_version: FUSION_VERSION.to_string(),
    }
}
