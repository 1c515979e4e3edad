//! Canonical request descriptors for the raster and statistics endpoints.
//!
//! Descriptors are plain values: once built they are never mutated, and two
//! descriptors built from the same inputs compare equal and serialize to the
//! same bytes.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::geometry::Bounds;
use super::layer::Layer;

/// Whole-second UTC timestamp format used on every wire
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Date-only format used by the statistics endpoint
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of each comparison period
pub const COMPARISON_PERIOD_DAYS: i64 = 30;

/// Fixed raster size requested from the overlay service
pub const OVERLAY_SIZE_PX: u32 = 2500;

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Half-open time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    /// A comparison period starting at `start`
    pub fn thirty_days_from(start: DateTime<Utc>) -> Self {
        Self { start, end: start + Duration::days(COMPARISON_PERIOD_DAYS) }
    }

    /// `start/end`, the WMS `TIME` parameter form
    pub fn to_time_range(&self) -> String {
        format!("{}/{}", format_timestamp(&self.start), format_timestamp(&self.end))
    }
}

/// Single overlay query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerQueryDescriptor {
    pub layer: Layer,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub cloud_ceiling: u8,
    pub bbox: Bounds,
}

impl LayerQueryDescriptor {
    pub fn period(&self) -> Period {
        Period { start: self.start_time, end: self.end_time }
    }

    /// GetMap parameters in canonical order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SERVICE", "WMS".to_string()),
            ("VERSION", "1.3.0".to_string()),
            ("REQUEST", "GetMap".to_string()),
            ("LAYERS", self.layer.overlay_id().to_string()),
            ("BBOX", self.bbox.to_wms_bbox()),
            ("CRS", "EPSG:4326".to_string()),
            ("WIDTH", OVERLAY_SIZE_PX.to_string()),
            ("HEIGHT", OVERLAY_SIZE_PX.to_string()),
            ("FORMAT", "image/png".to_string()),
            ("TIME", self.period().to_time_range()),
            ("MAXCC", self.cloud_ceiling.to_string()),
        ]
    }

    /// Query string exactly as the overlay service expects it.
    ///
    /// Values are emitted unescaped: layer ids, numbers and ISO timestamps
    /// contain nothing that needs encoding and the service rejects `%2C` in BBOX.
    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full GetMap URL against `base_url`
    pub fn to_url(&self, base_url: &str) -> String {
        let separator = if base_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", base_url, separator, self.to_query_string())
    }
}

/// Two equal-length periods over the same layer and area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonQueryDescriptor {
    pub layer: Layer,
    pub period1: Period,
    pub period2: Period,
    pub cloud_ceiling: u8,
    pub bbox: Bounds,
}

/// Multi-date statistics over a closed polygon ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsQueryDescriptor {
    pub indices: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `[lng, lat]` pairs, first point repeated at the end
    pub ring: Vec<[f64; 2]>,
}

/// Image pair returned by the comparison endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonImages {
    pub image1_url: String,
    pub image2_url: String,
}

/// Aggregated index statistics returned by the statistics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub indices: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub date_range: serde_json::Value,
    #[serde(default)]
    pub total_images: u64,
    #[serde(default)]
    pub aggregation_info: serde_json::Value,
}
