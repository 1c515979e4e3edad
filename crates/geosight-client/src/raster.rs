use async_trait::async_trait;
use serde::Serialize;

use geosight_core::models::{
    ComparisonImages, ComparisonQueryDescriptor, StatisticsQueryDescriptor, StatisticsReport,
};
use geosight_core::ports::RasterQueryService;
use geosight_core::{GeosightError, Result};

use crate::dto::{ApiEnvelope, ComparisonRequestBody, StatisticsRequestBody};
use crate::http::endpoint;

pub const COMPARISON_PATH: &str = "/api/comparison/download";
pub const STATISTICS_PATH: &str = "/api/time_series";

/// Comparison and time-series statistics endpoints of the analysis service
pub struct HttpRasterQueryService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRasterQueryService {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), client }
    }

    /// POST `body` and unwrap the `{success, error}` envelope.
    ///
    /// The service reports failures in the body, often with a non-2xx status;
    /// the body wins whenever it parses.
    async fn post_envelope<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope> {
        let url = endpoint(&self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GeosightError::network(&url, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GeosightError::network(&url, e))?;

        match serde_json::from_str::<ApiEnvelope>(&text) {
            Ok(envelope) => {
                if !envelope.success {
                    tracing::warn!(
                        endpoint = %url,
                        %status,
                        error = ?envelope.error,
                        "Request reported failure"
                    );
                }
                Ok(envelope)
            }
            Err(_) if !status.is_success() => Err(GeosightError::network(
                &url,
                format!("HTTP {}: {}", status, text.trim()),
            )),
            Err(e) => Err(GeosightError::network(&url, format!("Unreadable response: {}", e))),
        }
    }
}

#[async_trait]
impl RasterQueryService for HttpRasterQueryService {
    async fn compare(&self, query: &ComparisonQueryDescriptor) -> Result<ComparisonImages> {
        let body = ComparisonRequestBody::from(query);
        tracing::info!(layer = %body.layer, bbox = %body.bbox, "Requesting comparison images");
        self.post_envelope(COMPARISON_PATH, &body).await?.into_payload()
    }

    async fn statistics(&self, query: &StatisticsQueryDescriptor) -> Result<StatisticsReport> {
        let body = StatisticsRequestBody::from(query);
        tracing::info!(
            indices = ?body.indices,
            start = %body.start_date,
            end = %body.end_date,
            "Requesting index statistics"
        );
        self.post_envelope(STATISTICS_PATH, &body).await?.into_payload()
    }
}
