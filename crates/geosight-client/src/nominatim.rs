use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use url::Url;

use geosight_core::models::AddressComponents;
use geosight_core::ports::ReverseGeocoder;
use geosight_core::{GeosightError, Result};

use crate::dto::GeocodeJson;
use crate::http::{endpoint, ensure_success};

/// Reverse geocoder speaking the Nominatim `geocodejson` format
pub struct NominatimGeocoder {
    base_url: String,

    /// Sent on every request; Nominatim's usage policy rejects anonymous clients
    user_agent: String,

    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self { base_url: base_url.into(), user_agent: user_agent.into(), client }
    }

    fn reverse_url(&self, lat: f64, lng: f64) -> Result<Url> {
        let raw = endpoint(&self.base_url, "/reverse");
        let mut url = Url::parse(&raw).map_err(|e| GeosightError::ConfigInvalid {
            key: "geocoder_url".to_string(),
            reason: format!("Invalid URL {}: {}", raw, e),
        })?;
        url.query_pairs_mut()
            .append_pair("format", "geocodejson")
            .append_pair("lat", &lat.to_string())
            .append_pair("lon", &lng.to_string());
        Ok(url)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<AddressComponents> {
        let url = self.reverse_url(lat, lng)?;
        let endpoint = url.to_string();

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| GeosightError::network(&endpoint, e))?;
        let response = ensure_success(&endpoint, response).await?;

        let body: GeocodeJson = response
            .json()
            .await
            .map_err(|e| GeosightError::network(&endpoint, format!("Unreadable response: {}", e)))?;

        Ok(body.into_address())
    }
}
