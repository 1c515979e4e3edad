//! Wire shapes of the remote endpoints that differ from the domain types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use geosight_core::models::query::{format_timestamp, DATE_FORMAT};
use geosight_core::models::{
    AddressComponents, ComparisonQueryDescriptor, StatisticsQueryDescriptor,
};
use geosight_core::{GeosightError, Result};

/// Body of `POST /api/comparison/download`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRequestBody {
    pub layer: String,
    pub date1: String,
    pub date2: String,
    #[serde(rename = "endDate1")]
    pub end_date1: String,
    #[serde(rename = "endDate2")]
    pub end_date2: String,
    pub bbox: String,
    #[serde(rename = "cloudPercentage")]
    pub cloud_percentage: u8,
}

impl From<&ComparisonQueryDescriptor> for ComparisonRequestBody {
    fn from(query: &ComparisonQueryDescriptor) -> Self {
        Self {
            layer: query.layer.overlay_id().to_string(),
            date1: format_timestamp(&query.period1.start),
            date2: format_timestamp(&query.period2.start),
            end_date1: format_timestamp(&query.period1.end),
            end_date2: format_timestamp(&query.period2.end),
            bbox: query.bbox.to_wms_bbox(),
            cloud_percentage: query.cloud_ceiling,
        }
    }
}

/// Body of `POST /api/time_series`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRequestBody {
    pub geometry: Vec<[f64; 2]>,
    pub start_date: String,
    pub end_date: String,
    pub indices: Vec<String>,
}

impl From<&StatisticsQueryDescriptor> for StatisticsRequestBody {
    fn from(query: &StatisticsQueryDescriptor) -> Self {
        Self {
            geometry: query.ring.clone(),
            start_date: query.start_date.format(DATE_FORMAT).to_string(),
            end_date: query.end_date.format(DATE_FORMAT).to_string(),
            indices: query.indices.clone(),
        }
    }
}

/// `{success, error?, ...payload}` envelope of the raster endpoints
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ApiEnvelope {
    /// Payload of a successful response; the server's own message otherwise
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T> {
        if !self.success {
            return Err(GeosightError::upstream(
                self.error.unwrap_or_else(|| "request failed without an error message".to_string()),
            ));
        }
        Ok(serde_json::from_value(Value::Object(self.payload))?)
    }
}

/// GeocodeJSON response of the reverse geocoder
#[derive(Debug, Default, Deserialize)]
pub struct GeocodeJson {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeFeature {
    #[serde(default)]
    pub properties: GeocodeProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeProperties {
    #[serde(default)]
    pub geocoding: AddressComponents,
}

impl GeocodeJson {
    pub fn into_address(self) -> AddressComponents {
        self.features.into_iter().next().map(|f| f.properties.geocoding).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSessionBody<'a> {
    pub title: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    pub session: SessionRef,
}

/// Session ids come back as numbers or strings depending on the backend
#[derive(Debug, Deserialize)]
pub struct SessionRef {
    pub id: Value,
}

impl SessionRef {
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosight_core::models::{Bounds, ComparisonImages, Layer};
    use geosight_core::request::LayerRequestBuilder;
    use serde_json::json;

    #[test]
    fn test_comparison_body_wire_names() {
        let query = LayerRequestBuilder::build_comparison(
            Layer::Ndvi,
            "2024-01-01",
            "2024-06-01",
            20,
            Some(&Bounds::from_corners([5.0, 5.0], [6.0, 6.0])),
        )
        .unwrap();
        let body = serde_json::to_value(ComparisonRequestBody::from(&query)).unwrap();

        assert_eq!(
            body,
            json!({
                "layer": "NDVI-L2A",
                "date1": "2024-01-01T00:00:00Z",
                "date2": "2024-06-01T00:00:00Z",
                "endDate1": "2024-01-31T00:00:00Z",
                "endDate2": "2024-07-01T00:00:00Z",
                "bbox": "5,5,6,6",
                "cloudPercentage": 20
            })
        );
    }

    #[test]
    fn test_envelope_success_and_failure() {
        let ok: ApiEnvelope = serde_json::from_value(json!({
            "success": true,
            "image1_url": "http://img/1.png",
            "image2_url": "http://img/2.png"
        }))
        .unwrap();
        let images: ComparisonImages = ok.into_payload().unwrap();
        assert_eq!(images.image2_url, "http://img/2.png");

        let failed: ApiEnvelope =
            serde_json::from_value(json!({"success": false, "error": "no imagery"})).unwrap();
        let err = failed.into_payload::<ComparisonImages>().unwrap_err();
        assert_eq!(err.to_string(), "no imagery");
    }

    #[test]
    fn test_geocode_json_first_feature() {
        let parsed: GeocodeJson = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"properties": {"geocoding": {"city": "Nairobi", "country": "Kenya"}}},
                {"properties": {"geocoding": {"city": "Elsewhere"}}}
            ]
        }))
        .unwrap();
        assert_eq!(parsed.into_address().label(), "Nairobi, Kenya");

        let empty: GeocodeJson = serde_json::from_value(json!({"features": []})).unwrap();
        assert_eq!(empty.into_address(), AddressComponents::default());
    }

    #[test]
    fn test_session_id_forms() {
        let numeric: CreateSessionResponse =
            serde_json::from_value(json!({"session": {"id": 42}})).unwrap();
        assert_eq!(numeric.session.id_string().as_deref(), Some("42"));

        let missing: CreateSessionResponse =
            serde_json::from_value(json!({"session": {"id": null}})).unwrap();
        assert_eq!(missing.session.id_string(), None);
    }
}
