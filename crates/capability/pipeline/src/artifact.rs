//! 制品上送
//!
//! 触发事件可能附带制品（如工位相机的视频文件名）。上送发生在
//! 响应构建之后的后台任务里，失败只记日志，从不影响触发响应。

use crate::error::PipelineError;
use async_trait::async_trait;
use tracing::info;

/// 制品接收端。
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// 上送元数据信封与制品引用。
    async fn upload(
        &self,
        envelope: &serde_json::Value,
        artifact_ref: &str,
    ) -> Result<(), PipelineError>;
}

/// HTTP 制品接收端：POST JSON 信封到采集服务。
pub struct HttpArtifactSink {
    client: reqwest::Client,
    upload_url: String,
}

impl HttpArtifactSink {
    pub fn new(client: reqwest::Client, upload_url: impl Into<String>) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
        }
    }
}

#[async_trait]
impl ArtifactSink for HttpArtifactSink {
    async fn upload(
        &self,
        envelope: &serde_json::Value,
        artifact_ref: &str,
    ) -> Result<(), PipelineError> {
        let body = serde_json::json!({
            "artifact_ref": artifact_ref,
            "envelope": envelope,
        });
        self.client
            .post(&self.upload_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Internal(format!("artifact upload failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PipelineError::Internal(format!("artifact upload rejected: {}", e)))?;
        info!(target: "edge.pipeline", artifact_ref, "artifact uploaded");
        Ok(())
    }
}

/// 丢弃制品的接收端（未配置上送地址时使用）。
pub struct NoopArtifactSink;

#[async_trait]
impl ArtifactSink for NoopArtifactSink {
    async fn upload(
        &self,
        _envelope: &serde_json::Value,
        artifact_ref: &str,
    ) -> Result<(), PipelineError> {
        info!(target: "edge.pipeline", artifact_ref, "artifact upload skipped (no sink configured)");
        Ok(())
    }
}
