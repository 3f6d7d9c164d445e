//! 后台任务
//!
//! 由二进制入口拉起的两个周期任务：过期建议清扫、适配器配置
//! 热重载。任务内部失败只记日志，不退出循环。

use crate::error::PipelineError;
use edge_adapter::AdapterConfig;
use edge_fusion::FusionEngine;
use edge_recommend::RecommendationService;
use edge_storage::AdapterConfigStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// 周期清扫过期建议。
pub fn spawn_expiry_sweeper(
    service: Arc<RecommendationService>,
    interval_seconds: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = service.expire_stale().await {
                warn!(target: "edge.pipeline", error = %e, "expiry sweep failed");
            }
        }
    })
}

/// 轮询配置快照版本，变化时热重载适配器集合。
///
/// 重载对在途采集是原子的：换出前的快照继续服务到采集结束。
pub fn spawn_config_reloader(
    engine: Arc<FusionEngine>,
    store: Arc<dyn AdapterConfigStore>,
    initial_version: i64,
    interval_seconds: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_version = initial_version;
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let version = match store.snapshot_version().await {
                Ok(version) => version,
                Err(e) => {
                    warn!(target: "edge.pipeline", error = %e, "config version poll failed");
                    continue;
                }
            };
            if version == last_version {
                continue;
            }
            match load_adapter_configs(store.as_ref()).await {
                Ok(configs) => match engine.reload(configs).await {
                    Ok(()) => {
                        info!(
                            target: "edge.pipeline",
                            version,
                            "adapter configuration reloaded"
                        );
                        last_version = version;
                    }
                    Err(e) => {
                        warn!(target: "edge.pipeline", error = %e, "adapter reload failed")
                    }
                },
                Err(e) => warn!(target: "edge.pipeline", error = %e, "config load failed"),
            }
        }
    })
}

/// 从配置存储加载并解析启用的适配器配置。
///
/// 单条解析失败跳过并告警，不拖垮整次加载。
pub async fn load_adapter_configs(
    store: &dyn AdapterConfigStore,
) -> Result<Vec<AdapterConfig>, PipelineError> {
    let records = store.list_enabled().await?;
    let mut configs = Vec::with_capacity(records.len());
    for record in records {
        match AdapterConfig::from_json(&record.config) {
            Ok(config) => configs.push(config),
            Err(e) => warn!(
                target: "edge.pipeline",
                source = record.source_name,
                error = %e,
                "invalid adapter config skipped"
            ),
        }
    }
    Ok(configs)
}
