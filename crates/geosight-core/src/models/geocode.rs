use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label used when reverse geocoding yields nothing usable
pub const FALLBACK_LOCATION_LABEL: &str = "selected area";

/// Cache key: a coordinate rounded to 3 decimal places (~110 m)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeocodeKey {
    lat_milli: i64,
    lng_milli: i64,
}

impl GeocodeKey {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat_milli: (lat * 1000.0).round() as i64, lng_milli: (lng * 1000.0).round() as i64 }
    }

    pub fn lat(&self) -> f64 {
        self.lat_milli as f64 / 1000.0
    }

    pub fn lng(&self) -> f64 {
        self.lng_milli as f64 / 1000.0
    }
}

impl std::fmt::Display for GeocodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3},{:.3}", self.lat(), self.lng())
    }
}

/// Address hierarchy from a geocodejson `geocoding` object.
///
/// Fields the label does not use are kept in `other` so the full hierarchy can
/// be forwarded to the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl AddressComponents {
    /// `locality, state, country` where locality is the first of city, town,
    /// village or county that is present
    pub fn label(&self) -> String {
        let locality = [&self.city, &self.town, &self.village, &self.county]
            .into_iter()
            .find_map(|part| non_empty(part));

        let parts: Vec<&str> = locality
            .into_iter()
            .chain(non_empty(&self.state))
            .chain(non_empty(&self.country))
            .collect();

        if parts.is_empty() {
            FALLBACK_LOCATION_LABEL.to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn non_empty(part: &Option<String>) -> Option<&str> {
    part.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Cached outcome of one reverse-geocode lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeEntry {
    pub label: String,
    pub address: AddressComponents,
}

impl GeocodeEntry {
    pub fn from_address(address: AddressComponents) -> Self {
        Self { label: address.label(), address }
    }

    pub fn fallback() -> Self {
        Self { label: FALLBACK_LOCATION_LABEL.to_string(), address: AddressComponents::default() }
    }

    pub fn is_fallback(&self) -> bool {
        self.label == FALLBACK_LOCATION_LABEL && self.address == AddressComponents::default()
    }
}
