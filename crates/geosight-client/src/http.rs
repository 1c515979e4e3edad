//! Shared `reqwest` client construction and response checks

use std::time::Duration;

use geosight_core::config::LayeredConfig;
use geosight_core::{GeosightError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings every adapter's HTTP client is built from
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl ClientSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            user_agent: config.user_agent.value.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs.value),
        }
    }

    /// Client for request/response endpoints; the timeout covers the whole exchange
    pub fn build(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| GeosightError::ConfigInvalid {
                key: "http_client".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })
    }

    /// Client for streaming endpoints; the timeout bounds each read so long
    /// answers are not cut off
    pub fn build_streaming(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(self.request_timeout)
            .build()
            .map_err(|e| GeosightError::ConfigInvalid {
                key: "http_client".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })
    }
}

/// Join a base URL and an absolute path without doubling the slash
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Turn a non-2xx response into a `Network` error carrying the body text
pub(crate) async fn ensure_success(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(endpoint, %status, "Request rejected");
    Err(GeosightError::network(endpoint, format!("HTTP {}: {}", status, body.trim())))
}
