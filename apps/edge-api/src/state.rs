//! 应用共享状态

use edge_adapter::AdapterDeps;
use edge_discovery::NetworkScanner;
use edge_pipeline::PipelineService;
use edge_recommend::RecommendationService;
use std::sync::Arc;

/// 路由层共享状态。
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineService>,
    pub recommendations: Arc<RecommendationService>,
    pub scanner: Arc<NetworkScanner>,
    /// 连接测试构建临时适配器所需的驱动与 HTTP 客户端
    pub adapter_deps: AdapterDeps,
}
