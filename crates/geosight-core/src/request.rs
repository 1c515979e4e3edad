//! Builders turning UI parameters and the current geometry into canonical
//! request descriptors.
//!
//! Builders never touch the network and never substitute defaults: a missing
//! geometry, an out-of-range cloud ceiling or an unparseable date is a
//! `Validation` error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

use crate::error::{GeosightError, Result};
use crate::models::query::DATE_FORMAT;
use crate::models::{
    AnalysisRequest, Bounds, ComparisonQueryDescriptor, DrawnGeometry, GeocodeEntry, Layer,
    LayerQueryDescriptor, Period, StatisticsQueryDescriptor,
};
use crate::ring::to_ring;

pub const MAX_CLOUD_CEILING: i32 = 100;

/// Parse a user-supplied instant, truncated to whole seconds.
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`, any offset), a naive
/// `YYYY-MM-DDTHH:MM:SS` taken as UTC, or a bare `YYYY-MM-DD` at midnight UTC.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc).trunc_subsecs(0));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().trunc_subsecs(0));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(GeosightError::validation(format!(
        "malformed date '{}': expected YYYY-MM-DD or an RFC 3339 timestamp",
        trimmed
    )))
}

fn require_bounds(bbox: Option<&Bounds>) -> Result<Bounds> {
    let bounds = bbox.ok_or_else(|| GeosightError::validation("no area drawn on the map"))?;
    bounds.validate()?;
    Ok(*bounds)
}

fn require_cloud_ceiling(cloud_ceiling: i32) -> Result<u8> {
    if !(0..=MAX_CLOUD_CEILING).contains(&cloud_ceiling) {
        return Err(GeosightError::validation(format!(
            "cloud ceiling {} outside [0, {}]",
            cloud_ceiling, MAX_CLOUD_CEILING
        )));
    }
    Ok(cloud_ceiling as u8)
}

fn require_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end < start {
        return Err(GeosightError::validation("end date precedes start date"));
    }
    Ok(())
}

/// Stateless descriptor factory
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerRequestBuilder;

impl LayerRequestBuilder {
    /// Single overlay for one layer and time window
    pub fn build_overlay(
        layer: Layer,
        start: &str,
        end: &str,
        cloud_ceiling: i32,
        bbox: Option<&Bounds>,
    ) -> Result<LayerQueryDescriptor> {
        let bbox = require_bounds(bbox)?;
        let cloud_ceiling = require_cloud_ceiling(cloud_ceiling)?;
        let start_time = parse_instant(start)?;
        let end_time = parse_instant(end)?;
        require_ordered(start_time, end_time)?;

        Ok(LayerQueryDescriptor { layer, start_time, end_time, cloud_ceiling, bbox })
    }

    /// Two 30-day periods over the same layer and area
    pub fn build_comparison(
        layer: Layer,
        period1_start: &str,
        period2_start: &str,
        cloud_ceiling: i32,
        bbox: Option<&Bounds>,
    ) -> Result<ComparisonQueryDescriptor> {
        let bbox = require_bounds(bbox)?;
        let cloud_ceiling = require_cloud_ceiling(cloud_ceiling)?;
        let first = parse_instant(period1_start)?;
        let second = parse_instant(period2_start)?;
        if first >= second {
            return Err(GeosightError::validation("periods out of order"));
        }

        Ok(ComparisonQueryDescriptor {
            layer,
            period1: Period::thirty_days_from(first),
            period2: Period::thirty_days_from(second),
            cloud_ceiling,
            bbox,
        })
    }

    /// Multi-date statistics of `indices` over the drawn geometry
    pub fn build_statistics(
        indices: &[Layer],
        start: &str,
        end: &str,
        geometry: Option<&DrawnGeometry>,
    ) -> Result<StatisticsQueryDescriptor> {
        let geometry =
            geometry.ok_or_else(|| GeosightError::validation("no area drawn on the map"))?;
        let ring = to_ring(geometry)?;

        let mut names: Vec<String> = Vec::with_capacity(indices.len());
        for layer in indices {
            let index = layer.statistics_index().ok_or_else(|| {
                GeosightError::validation(format!("layer {} has no statistics index", layer))
            })?;
            if !names.iter().any(|existing| existing == index) {
                names.push(index.to_string());
            }
        }
        if names.is_empty() {
            return Err(GeosightError::validation("select at least one index"));
        }

        let start_time = parse_instant(start)?;
        let end_time = parse_instant(end)?;
        require_ordered(start_time, end_time)?;

        Ok(StatisticsQueryDescriptor {
            indices: names,
            start_date: start_time.date_naive(),
            end_date: end_time.date_naive(),
            ring,
        })
    }

    /// Body of the streaming analysis request for a loaded overlay
    pub fn build_analysis(
        descriptor: &LayerQueryDescriptor,
        wms_base_url: &str,
        location: &GeocodeEntry,
    ) -> AnalysisRequest {
        let date_range = format!(
            "{} to {}",
            descriptor.start_time.format(DATE_FORMAT),
            descriptor.end_time.format(DATE_FORMAT)
        );
        let cloud_coverage = format!("{}%", descriptor.cloud_ceiling);

        let message = format!(
            "Analyze this satellite imagery with the following parameters:\n\n\
             Area of interest: {}\n\
             Data layer: {}\n\
             Date range: {}\n\
             Cloud coverage: {}\n\n\
             Please provide a detailed interpretation of the satellite data, vegetation health, \
             water bodies, geological features, and any environmental patterns visible in the \
             imagery.",
            location.label,
            descriptor.layer.overlay_id(),
            date_range,
            cloud_coverage
        );

        AnalysisRequest {
            wms_url: descriptor.to_url(wms_base_url),
            layer: descriptor.layer.display_name().to_string(),
            date_range,
            cloud_coverage,
            location_name: location.label.clone(),
            address_details: location.address.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShapeKind;

    fn bbox() -> Bounds {
        Bounds::from_corners([5.0, 5.0], [6.0, 6.0])
    }

    #[test]
    fn test_parse_instant_formats() {
        assert_eq!(parse_instant("2024-01-01").unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(
            parse_instant("2024-01-01T10:30:15.789Z").unwrap().to_rfc3339(),
            "2024-01-01T10:30:15+00:00"
        );
        assert_eq!(
            parse_instant("2024-01-01T12:00:00+02:00").unwrap().to_rfc3339(),
            "2024-01-01T10:00:00+00:00"
        );
        assert_eq!(
            parse_instant("2024-01-01T08:00:00").unwrap().to_rfc3339(),
            "2024-01-01T08:00:00+00:00"
        );
        assert!(parse_instant("01/02/2024").unwrap_err().is_validation());
        assert!(parse_instant("2024-02-30").is_err());
    }

    #[test]
    fn test_overlay_truncates_to_seconds() {
        let descriptor = LayerRequestBuilder::build_overlay(
            Layer::Ndvi,
            "2024-01-01T00:00:00.999Z",
            "2024-01-31",
            20,
            Some(&bbox()),
        )
        .unwrap();
        assert!(descriptor
            .to_query_string()
            .contains("TIME=2024-01-01T00:00:00Z/2024-01-31T00:00:00Z"));
    }

    #[test]
    fn test_overlay_validation() {
        let missing =
            LayerRequestBuilder::build_overlay(Layer::Ndvi, "2024-01-01", "2024-01-31", 20, None);
        assert!(missing.unwrap_err().is_validation());

        for ceiling in [-1, 101] {
            let result = LayerRequestBuilder::build_overlay(
                Layer::Ndvi,
                "2024-01-01",
                "2024-01-31",
                ceiling,
                Some(&bbox()),
            );
            assert!(result.unwrap_err().is_validation());
        }

        let reversed = LayerRequestBuilder::build_overlay(
            Layer::Ndvi,
            "2024-02-01",
            "2024-01-01",
            20,
            Some(&bbox()),
        );
        assert!(reversed.unwrap_err().is_validation());

        let edges = [0, 100].map(|ceiling| {
            LayerRequestBuilder::build_overlay(
                Layer::Ndvi,
                "2024-01-01",
                "2024-01-31",
                ceiling,
                Some(&bbox()),
            )
        });
        assert!(edges.iter().all(Result::is_ok));
    }

    #[test]
    fn test_comparison_periods() {
        let descriptor = LayerRequestBuilder::build_comparison(
            Layer::Ndwi,
            "2024-01-01",
            "2024-03-01",
            30,
            Some(&bbox()),
        )
        .unwrap();

        assert_eq!(descriptor.period1.to_time_range(), "2024-01-01T00:00:00Z/2024-01-31T00:00:00Z");
        assert_eq!(descriptor.period2.to_time_range(), "2024-03-01T00:00:00Z/2024-03-31T00:00:00Z");
        assert!(descriptor.period1.start < descriptor.period2.start);
    }

    #[test]
    fn test_comparison_rejects_unordered_periods() {
        for (first, second) in [("2024-03-01", "2024-03-01"), ("2024-04-01", "2024-03-01")] {
            let err =
                LayerRequestBuilder::build_comparison(Layer::Ndvi, first, second, 20, Some(&bbox()))
                    .unwrap_err();
            assert!(matches!(
                err,
                GeosightError::Validation { ref reason } if reason == "periods out of order"
            ));
        }
    }

    #[test]
    fn test_statistics_maps_index_names() {
        let geometry = DrawnGeometry::new(ShapeKind::Rectangle, bbox());
        let descriptor = LayerRequestBuilder::build_statistics(
            &[Layer::Ndvi, Layer::LaiSavi, Layer::Ndvi],
            "2024-01-01",
            "2024-01-31T23:59:59Z",
            Some(&geometry),
        )
        .unwrap();

        assert_eq!(descriptor.indices, vec!["NDVI", "SAVI"]);
        assert_eq!(descriptor.start_date.to_string(), "2024-01-01");
        assert_eq!(descriptor.end_date.to_string(), "2024-01-31");
        assert_eq!(descriptor.ring.first(), descriptor.ring.last());
    }

    #[test]
    fn test_statistics_validation() {
        let geometry = DrawnGeometry::new(ShapeKind::Circle, bbox());
        let no_geometry =
            LayerRequestBuilder::build_statistics(&[Layer::Ndvi], "2024-01-01", "2024-01-31", None);
        assert!(no_geometry.unwrap_err().is_validation());

        let no_index =
            LayerRequestBuilder::build_statistics(&[], "2024-01-01", "2024-01-31", Some(&geometry));
        assert!(no_index.unwrap_err().is_validation());

        let not_an_index = LayerRequestBuilder::build_statistics(
            &[Layer::TrueColor],
            "2024-01-01",
            "2024-01-31",
            Some(&geometry),
        );
        assert!(not_an_index.unwrap_err().is_validation());
    }

    #[test]
    fn test_analysis_request_fields() {
        let descriptor = LayerRequestBuilder::build_overlay(
            Layer::LaiSavi,
            "2024-01-01",
            "2024-01-31",
            15,
            Some(&bbox()),
        )
        .unwrap();
        let location = GeocodeEntry::fallback();
        let request =
            LayerRequestBuilder::build_analysis(&descriptor, "https://wms.example/ogc", &location);

        assert_eq!(request.layer, "LAI SAVI");
        assert_eq!(request.date_range, "2024-01-01 to 2024-01-31");
        assert_eq!(request.cloud_coverage, "15%");
        assert_eq!(request.location_name, "selected area");
        assert!(request.wms_url.starts_with("https://wms.example/ogc?SERVICE=WMS"));
        assert!(request.message.contains("Area of interest: selected area"));
        assert!(request.message.contains("Data layer: LAI_SAVI"));
    }
}
