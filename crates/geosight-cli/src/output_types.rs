use geosight_core::models::{AddressComponents, Message};
use serde::Serialize;
use tabled::Tabled;

/// Output for overlay command
#[derive(Debug, Serialize)]
pub struct OverlayOutput {
    pub url: String,
    pub layer: String,
    pub layer_name: String,
    pub date_range: String,
    pub cloud_coverage: String,
    pub bbox: String,
}

/// Output for compare command
#[derive(Debug, Serialize)]
pub struct CompareOutput {
    pub layer: String,
    pub period1: PeriodImage,
    pub period2: PeriodImage,
}

#[derive(Debug, Serialize)]
pub struct PeriodImage {
    pub label: String,
    pub image_url: String,
}

/// Output for stats command
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub indices: serde_json::Value,
    pub date_range: serde_json::Value,
    pub total_images: u64,
    pub aggregation_info: serde_json::Value,
}

#[derive(Debug, Tabled)]
pub struct IndexRow {
    #[tabled(rename = "Index")]
    pub index: String,
    #[tabled(rename = "Statistics")]
    pub statistics: String,
}

/// Output for geocode command
#[derive(Debug, Serialize)]
pub struct GeocodeOutput {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
    pub fallback: bool,
    pub address: AddressComponents,
}

/// Output for analyze command
#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub state: String,
    pub location: Option<String>,
    pub messages: Vec<Message>,
    pub saved_session: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "Layer")]
    pub overlay_id: String,
    #[tabled(rename = "Name")]
    pub display_name: String,
    #[tabled(rename = "Statistics Index")]
    pub statistics_index: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
