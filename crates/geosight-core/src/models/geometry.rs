//! Drawn-region types shared by the session state, request builders and map canvas.
//!
//! Coordinates follow the map widget's convention: `LatLng` is latitude first,
//! bounds are given as south-west / north-east corners.

use serde::{Deserialize, Serialize};

use crate::error::{GeosightError, Result};

/// A WGS 84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

/// Axis-aligned bounds of a drawn shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self { south_west, north_east }
    }

    /// Build from `[[south, west], [north, east]]` corner pairs
    pub fn from_corners(south_west: [f64; 2], north_east: [f64; 2]) -> Self {
        Self::new(south_west.into(), north_east.into())
    }

    pub fn south(&self) -> f64 {
        self.south_west.lat
    }

    pub fn west(&self) -> f64 {
        self.south_west.lng
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat
    }

    pub fn east(&self) -> f64 {
        self.north_east.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng::new((self.south() + self.north()) / 2.0, (self.west() + self.east()) / 2.0)
    }

    /// Reject bounds a raster service would misinterpret
    pub fn validate(&self) -> Result<()> {
        if !self.south_west.is_finite() || !self.north_east.is_finite() {
            return Err(GeosightError::validation("bounds contain non-finite coordinates"));
        }
        if self.south() > self.north() || self.west() > self.east() {
            return Err(GeosightError::validation(
                "bounds are inverted: south-west corner must precede north-east corner",
            ));
        }
        if self.south() < -90.0 || self.north() > 90.0 {
            return Err(GeosightError::validation("latitude outside [-90, 90]"));
        }
        Ok(())
    }

    /// `south,west,north,east`, the axis order WMS 1.3.0 uses for EPSG:4326
    pub fn to_wms_bbox(&self) -> String {
        format!("{},{},{},{}", self.south(), self.west(), self.north(), self.east())
    }
}

/// Kind of shape produced by the drawing tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Polygon,
    Rectangle,
    Circle,
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ShapeKind {
    type Err = GeosightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "polygon" => Ok(ShapeKind::Polygon),
            "rectangle" | "rect" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            other => Err(GeosightError::validation(format!(
                "unknown shape '{}'. Use polygon, rectangle, or circle",
                other
            ))),
        }
    }
}

/// The single active region drawn on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnGeometry {
    pub shape: ShapeKind,
    pub bounds: Bounds,
    /// Polygon vertices as drawn, when the canvas reports them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outline: Vec<LatLng>,
}

impl DrawnGeometry {
    pub fn new(shape: ShapeKind, bounds: Bounds) -> Self {
        Self { shape, bounds, outline: Vec::new() }
    }

    /// A polygon whose bounds are derived from its vertices
    pub fn polygon(outline: Vec<LatLng>) -> Result<Self> {
        let first = outline
            .first()
            .ok_or_else(|| GeosightError::validation("polygon has no vertices"))?;

        let mut south_west = *first;
        let mut north_east = *first;
        for vertex in &outline {
            south_west.lat = south_west.lat.min(vertex.lat);
            south_west.lng = south_west.lng.min(vertex.lng);
            north_east.lat = north_east.lat.max(vertex.lat);
            north_east.lng = north_east.lng.max(vertex.lng);
        }

        Ok(Self { shape: ShapeKind::Polygon, bounds: Bounds::new(south_west, north_east), outline })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wms_bbox_order() {
        let bounds = Bounds::from_corners([5.0, 5.0], [6.0, 6.0]);
        assert_eq!(bounds.to_wms_bbox(), "5,5,6,6");

        let bounds = Bounds::from_corners([-8.75, 115.1], [-8.5, 115.35]);
        assert_eq!(bounds.to_wms_bbox(), "-8.75,115.1,-8.5,115.35");
    }

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::from_corners([5.0, 5.0], [6.0, 6.0]).validate().is_ok());
        assert!(Bounds::from_corners([6.0, 5.0], [5.0, 6.0]).validate().is_err());
        assert!(Bounds::from_corners([f64::NAN, 5.0], [6.0, 6.0]).validate().is_err());
        assert!(Bounds::from_corners([-95.0, 5.0], [6.0, 6.0]).validate().is_err());
    }

    #[test]
    fn test_polygon_bounds_from_outline() {
        let geometry = DrawnGeometry::polygon(vec![
            LatLng::new(1.0, 2.0),
            LatLng::new(3.0, 1.0),
            LatLng::new(2.0, 4.0),
        ])
        .unwrap();

        assert_eq!(geometry.shape, ShapeKind::Polygon);
        assert_eq!(geometry.bounds, Bounds::from_corners([1.0, 1.0], [3.0, 4.0]));
        assert!(DrawnGeometry::polygon(Vec::new()).is_err());
    }

    #[test]
    fn test_shape_kind_parsing() {
        assert_eq!("Circle".parse::<ShapeKind>().unwrap(), ShapeKind::Circle);
        assert_eq!("rect".parse::<ShapeKind>().unwrap(), ShapeKind::Rectangle);
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }
}
