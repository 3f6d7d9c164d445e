//! 融合引擎错误类型定义

use edge_adapter::AdapterError;

/// 融合引擎错误
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    /// 适配器构建失败（配置非法、驱动缺失、名称重复）
    #[error("adapter build failed: {0}")]
    Build(#[from] AdapterError),
}
