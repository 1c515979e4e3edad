//! Memoizing reverse-geocode lookups.
//!
//! Entries are keyed by the coordinate rounded to three decimals and live for
//! the lifetime of the cache. Failed lookups are cached as the fallback entry,
//! so a coordinate reaches the network at most once, barring concurrent first
//! lookups of the same key which may both go out.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use geosight_core::models::{GeocodeEntry, GeocodeKey};
use geosight_core::ports::ReverseGeocoder;

pub struct GeocodeCache {
    geocoder: Arc<dyn ReverseGeocoder>,
    entries: RwLock<HashMap<GeocodeKey, GeocodeEntry>>,
}

impl GeocodeCache {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { geocoder, entries: RwLock::new(HashMap::new()) }
    }

    /// Human-readable place for a coordinate; never fails
    pub async fn lookup(&self, lat: f64, lng: f64) -> GeocodeEntry {
        let key = GeocodeKey::new(lat, lng);
        if let Some(hit) = self.cached(&key) {
            tracing::debug!(%key, label = %hit.label, "Geocode cache hit");
            return hit;
        }

        let entry = match self.geocoder.reverse(lat, lng).await {
            Ok(address) => GeocodeEntry::from_address(address),
            Err(e) => {
                tracing::warn!(%key, error = %e, "Reverse geocoding failed; using fallback label");
                GeocodeEntry::fallback()
            }
        };

        // First writer wins so a cached entry never changes
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.entry(key).or_insert(entry).clone()
    }

    pub fn cached(&self, key: &GeocodeKey) -> Option<GeocodeEntry> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner()).get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
