//! 边缘网关 HTTP 服务入口
//!
//! 装配顺序：配置 → 日志 → 存储后端 → 适配器集合 → 融合引擎 →
//! 建议服务 → 流水线 → 后台任务 → HTTP 路由。收到停机信号后
//! 先停止接收请求，再断开全部适配器。

mod error;
mod handlers;
mod routes;
mod state;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use edge_adapter::AdapterDeps;
use edge_config::{AppConfig, StoreBackend};
use edge_discovery::NetworkScanner;
use edge_fusion::{FusionEngine, ThresholdScorer};
use edge_pipeline::{
    ArtifactSink, HttpArtifactSink, NoopArtifactSink, PipelineService, load_adapter_configs,
    spawn_config_reloader, spawn_expiry_sweeper,
};
use edge_recommend::RecommendationService;
use edge_storage::{
    AdapterConfigRecord, AdapterConfigStore, AuditLogStore, ContextLookup, FeedbackQueueStore,
    InMemoryAdapterConfigStore, InMemoryAuditLogStore, InMemoryContextStore,
    InMemoryFeedbackQueueStore, InMemoryRecommendationStore, InMemoryRecordStore,
    InMemorySafetyLimitStore, PgAdapterConfigStore, PgAuditLogStore, PgFeedbackQueueStore,
    PgRecommendationStore, PgRecordStore, PgSafetyLimitStore, RecommendationStore, RecordStore,
    RedisContextStore, SafetyLimitStore, connect_pool,
};
use edge_telemetry::{init_tracing, new_request_ids};
use state::AppState;
use std::sync::Arc;
use tracing::{Instrument, info};

/// 按后端装配好的全部存储句柄。
struct Stores {
    recommendations: Arc<dyn RecommendationStore>,
    audit: Arc<dyn AuditLogStore>,
    safety_limits: Arc<dyn SafetyLimitStore>,
    records: Arc<dyn RecordStore>,
    feedback: Arc<dyn FeedbackQueueStore>,
    adapter_configs: Arc<dyn AdapterConfigStore>,
    context: Arc<dyn ContextLookup>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    let stores = build_stores(&config).await?;

    // 演示/离线模式：种入一组模拟数据源配置
    if config.use_mock_sources {
        for record in mock_source_records() {
            stores.adapter_configs.upsert(record).await?;
        }
        info!(target: "edge.api", "mock data sources seeded");
    }

    let adapter_deps = AdapterDeps::default();
    let engine = Arc::new(FusionEngine::new(
        adapter_deps.clone(),
        Arc::new(ThresholdScorer),
        config.adapter_read_timeout_ms,
    ));
    let adapter_configs = load_adapter_configs(stores.adapter_configs.as_ref()).await?;
    engine.initialize(adapter_configs).await?;
    let initial_version = stores.adapter_configs.snapshot_version().await?;

    let recommendations = Arc::new(RecommendationService::new(
        stores.recommendations.clone(),
        stores.audit.clone(),
        stores.safety_limits.clone(),
        config.recommendation_expiration_minutes,
    ));

    let artifact_sink: Arc<dyn ArtifactSink> = match &config.artifact_upload_url {
        Some(url) => Arc::new(HttpArtifactSink::new(reqwest::Client::new(), url.clone())),
        None => Arc::new(NoopArtifactSink),
    };
    let pipeline = Arc::new(PipelineService::new(
        engine.clone(),
        stores.context.clone(),
        stores.records.clone(),
        stores.feedback.clone(),
        recommendations.clone(),
        artifact_sink,
        config.feedback_confidence_threshold,
    ));

    // 后台任务：过期清扫 + 配置热重载
    spawn_expiry_sweeper(recommendations.clone(), config.expiry_sweep_seconds);
    spawn_config_reloader(
        engine.clone(),
        stores.adapter_configs.clone(),
        initial_version,
        config.config_reload_seconds,
    );

    let app_state = AppState {
        pipeline,
        recommendations,
        scanner: Arc::new(NetworkScanner::new(config.discovery_timeout_ms)),
        adapter_deps,
    };
    let app = routes::build_router(app_state).layer(middleware::from_fn(request_context));

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "edge.api", addr = %config.http_addr, "edge gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.shutdown().await;
    Ok(())
}

async fn build_stores(config: &AppConfig) -> Result<Stores, Box<dyn std::error::Error>> {
    match config.store_backend {
        StoreBackend::Memory => {
            let context = Arc::new(InMemoryContextStore::new());
            if config.use_mock_sources {
                // 演示上下文，配合模拟数据源做端到端冒烟
                let mut demo = serde_json::Map::new();
                demo.insert("work_order".to_string(), serde_json::json!("WO-DEMO"));
                demo.insert("station".to_string(), serde_json::json!("line1-press"));
                context.put("demo-context", demo);
            }
            let audit = Arc::new(InMemoryAuditLogStore::new());
            Ok(Stores {
                recommendations: Arc::new(InMemoryRecommendationStore::new(audit.clone())),
                audit,
                safety_limits: Arc::new(InMemorySafetyLimitStore::new()),
                records: Arc::new(InMemoryRecordStore::new()),
                feedback: Arc::new(InMemoryFeedbackQueueStore::new()),
                adapter_configs: Arc::new(InMemoryAdapterConfigStore::new()),
                context,
            })
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("EDGE_DATABASE_URL is required for the postgres backend")?;
            let pool = connect_pool(database_url).await?;
            let redis_client = redis::Client::open(config.redis_url.as_str())?;
            Ok(Stores {
                recommendations: Arc::new(PgRecommendationStore::new(pool.clone())),
                audit: Arc::new(PgAuditLogStore::new(pool.clone())),
                safety_limits: Arc::new(PgSafetyLimitStore::new(pool.clone())),
                records: Arc::new(PgRecordStore::new(pool.clone())),
                feedback: Arc::new(PgFeedbackQueueStore::new(pool.clone())),
                adapter_configs: Arc::new(PgAdapterConfigStore::new(pool)),
                context: Arc::new(RedisContextStore::new(redis_client)),
            })
        }
    }
}

/// 演示用模拟数据源配置（PLC / MES / ERP 各一）。
fn mock_source_records() -> Vec<AdapterConfigRecord> {
    let now = domain::now_epoch_ms();
    let sources = [
        (
            "plc-sim",
            "plc",
            serde_json::json!({
                "source_name": "plc-sim",
                "category": "plc",
                "protocol": "mock",
                "field_mappings": {
                    "kind": "mock",
                    "values": {
                        "temperature": 72.0,
                        "vibration": 2.5,
                        "pressure": 100.0,
                        "humidity": 45.0,
                        "cycle_time": 20.0
                    }
                }
            }),
        ),
        (
            "mes-sim",
            "mes",
            serde_json::json!({
                "source_name": "mes-sim",
                "category": "mes",
                "protocol": "mock",
                "field_mappings": {
                    "kind": "mock",
                    "values": {
                        "work_order": "WO-12345",
                        "production_count": 120,
                        "oee": 0.91
                    }
                }
            }),
        ),
        (
            "erp-sim",
            "erp",
            serde_json::json!({
                "source_name": "erp-sim",
                "category": "erp",
                "protocol": "mock",
                "field_mappings": {
                    "kind": "mock",
                    "values": {
                        "material_number": "MAT-4711",
                        "batch_number": "BATCH-042"
                    }
                }
            }),
        ),
    ];
    sources
        .into_iter()
        .map(|(source_name, category, config)| AdapterConfigRecord {
            source_name: source_name.to_string(),
            category: category.to_string(),
            enabled: true,
            config: config.to_string(),
            updated_at_ms: now,
        })
        .collect()
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    // 生成 request_id 与 trace_id，并注入请求扩展与日志
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!(target: "edge.api", "shutdown signal received");
}
