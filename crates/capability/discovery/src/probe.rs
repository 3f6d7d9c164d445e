//! 连接验证
//!
//! 入网前对候选配置做一次实连验证：构建对应适配器、连接、
//! 读取少量样例字段。只验证，不落库。

use domain::FieldMap;
use edge_adapter::{AdapterConfig, AdapterDeps, AdapterError, build_adapter};
use tracing::info;

/// 样例读取的字段数上限。
const SAMPLE_FIELD_LIMIT: usize = 3;

/// 连接验证结果。
#[derive(Debug)]
pub struct TestOutcome {
    pub success: bool,
    pub message: String,
    pub sample_data: FieldMap,
}

/// 用候选配置实连设备并读样例数据。
///
/// 配置非法或驱动缺失时返回 AdapterError；连不上或读不到数据
/// 不算错误，以 `success = false` 的结果返回。
pub async fn test_connection(
    config: AdapterConfig,
    deps: &AdapterDeps,
    identifier: &str,
) -> Result<TestOutcome, AdapterError> {
    let source_name = config.source_name.clone();
    let mut adapter = build_adapter(config, deps)?;

    if !adapter.connect().await {
        return Ok(TestOutcome {
            success: false,
            message: "connection failed".to_string(),
            sample_data: FieldMap::new(),
        });
    }

    let fields = adapter.read(identifier).await;
    adapter.disconnect().await;

    if fields.is_empty() {
        return Ok(TestOutcome {
            success: false,
            message: "connected but no data returned".to_string(),
            sample_data: FieldMap::new(),
        });
    }

    let sample_data: FieldMap = fields
        .into_iter()
        .filter(|(name, _)| name != "timestamp")
        .take(SAMPLE_FIELD_LIMIT)
        .collect();
    info!(
        target: "edge.discovery",
        source = source_name,
        fields = sample_data.len(),
        "connection test succeeded"
    );
    Ok(TestOutcome {
        success: true,
        message: "connection successful".to_string(),
        sample_data,
    })
}
