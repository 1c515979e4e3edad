use async_trait::async_trait;
use serde::Serialize;

use geosight_core::models::{AnalysisRequest, FollowUpRequest};
use geosight_core::ports::{AnalysisBackend, ChunkStream};
use geosight_core::{GeosightError, Result};

use crate::http::{endpoint, ensure_success};
use crate::sse::decode_stream;

pub const ANALYZE_PATH: &str = "/api/vision/analyze_satellite_stream";
pub const CHAT_PATH: &str = "/api/vision/chat_stream";

/// Streaming analysis backend over HTTP
pub struct HttpAnalysisBackend {
    /// Base URL of the analysis service (e.g., "http://chat.misbar.africa")
    base_url: String,

    /// HTTP client; built with a per-read timeout so long answers survive
    client: reqwest::Client,
}

impl HttpAnalysisBackend {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), client }
    }

    async fn open<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<ChunkStream> {
        let url = endpoint(&self.base_url, path);
        tracing::debug!(endpoint = %url, "Opening response stream");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                GeosightError::network(
                    &url,
                    format!(
                        "Failed to reach the analysis service: {}. Check that it is running at {}",
                        e, self.base_url
                    ),
                )
            })?;
        let response = ensure_success(&url, response).await?;

        Ok(decode_stream(response.bytes_stream(), url))
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn open_analysis(&self, request: &AnalysisRequest) -> Result<ChunkStream> {
        self.open(ANALYZE_PATH, request).await
    }

    async fn open_follow_up(&self, request: &FollowUpRequest) -> Result<ChunkStream> {
        self.open(CHAT_PATH, request).await
    }
}
