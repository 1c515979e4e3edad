//! Conversion of drawn shapes into the closed polygon ring the statistics
//! endpoint expects.

use geo::algorithm::orient::{Direction, Orient};
use geo::{coord, Coord, LineString, Polygon, Rect};
use std::f64::consts::PI;

use crate::error::{GeosightError, Result};
use crate::models::{Bounds, DrawnGeometry, LatLng, ShapeKind};

/// Vertices used to approximate a circle. The ring carries one more point
/// because it is closed.
pub const CIRCLE_RING_VERTICES: usize = 64;

/// Closed `[lng, lat]` ring for `geometry`, exterior wound counter-clockwise.
///
/// Polygons use their outline when the canvas reported one and their bounds
/// otherwise. Circles are approximated by the ellipse inscribed in their
/// bounds, which in degree space is the circle the map drew.
pub fn to_ring(geometry: &DrawnGeometry) -> Result<Vec<[f64; 2]>> {
    geometry.bounds.validate()?;
    if geometry.bounds.south() == geometry.bounds.north()
        || geometry.bounds.west() == geometry.bounds.east()
    {
        return Err(GeosightError::validation("drawn area has zero extent"));
    }

    let polygon = match geometry.shape {
        ShapeKind::Rectangle => bounds_polygon(&geometry.bounds),
        ShapeKind::Polygon if geometry.outline.is_empty() => bounds_polygon(&geometry.bounds),
        ShapeKind::Polygon => outline_polygon(&geometry.outline)?,
        ShapeKind::Circle => circle_polygon(&geometry.bounds),
    };

    let oriented = polygon.orient(Direction::Default);
    Ok(oriented.exterior().coords().map(|c| [c.x, c.y]).collect())
}

fn bounds_polygon(bounds: &Bounds) -> Polygon<f64> {
    Rect::new(
        coord! { x: bounds.west(), y: bounds.south() },
        coord! { x: bounds.east(), y: bounds.north() },
    )
    .to_polygon()
}

fn outline_polygon(outline: &[LatLng]) -> Result<Polygon<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(outline.len() + 1);
    for vertex in outline {
        if !vertex.lat.is_finite() || !vertex.lng.is_finite() {
            return Err(GeosightError::validation("polygon vertex is not finite"));
        }
        let c = coord! { x: vertex.lng, y: vertex.lat };
        if coords.last() != Some(&c) {
            coords.push(c);
        }
    }
    // An explicitly closed outline is fine; Polygon::new closes it otherwise
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return Err(GeosightError::validation("polygon needs at least 3 distinct vertices"));
    }

    Ok(Polygon::new(LineString::new(coords), vec![]))
}

fn circle_polygon(bounds: &Bounds) -> Polygon<f64> {
    let center = bounds.center();
    let rx = (bounds.east() - bounds.west()) / 2.0;
    let ry = (bounds.north() - bounds.south()) / 2.0;

    let coords: Vec<Coord<f64>> = (0..CIRCLE_RING_VERTICES)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / CIRCLE_RING_VERTICES as f64;
            coord! { x: center.lng + rx * theta.cos(), y: center.lat + ry * theta.sin() }
        })
        .collect();

    Polygon::new(LineString::new(coords), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_closed(ring: &[[f64; 2]]) -> bool {
        ring.len() >= 4 && ring.first() == ring.last()
    }

    /// Shoelace sum; positive for counter-clockwise rings
    fn signed_area(ring: &[[f64; 2]]) -> f64 {
        ring.windows(2).map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1]).sum::<f64>() / 2.0
    }

    #[test]
    fn test_rectangle_ring() {
        let geometry = DrawnGeometry::new(
            ShapeKind::Rectangle,
            Bounds::from_corners([5.0, 10.0], [6.0, 12.0]),
        );
        let ring = to_ring(&geometry).unwrap();

        assert_eq!(ring.len(), 5);
        assert!(is_closed(&ring));
        for corner in [[10.0, 5.0], [12.0, 5.0], [12.0, 6.0], [10.0, 6.0]] {
            assert!(ring.contains(&corner), "missing {:?}", corner);
        }
        assert!((signed_area(&ring) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_circle_ring_uses_fixed_vertex_count() {
        let geometry =
            DrawnGeometry::new(ShapeKind::Circle, Bounds::from_corners([-1.0, -2.0], [1.0, 2.0]));
        let ring = to_ring(&geometry).unwrap();

        assert_eq!(ring.len(), CIRCLE_RING_VERTICES + 1);
        assert!(is_closed(&ring));
        for [lng, lat] in &ring {
            assert!(*lng >= -2.0 - 1e-9 && *lng <= 2.0 + 1e-9);
            assert!(*lat >= -1.0 - 1e-9 && *lat <= 1.0 + 1e-9);
        }
        assert!(signed_area(&ring) > 0.0);
    }

    #[test]
    fn test_polygon_outline_is_closed_and_oriented() {
        // Clockwise input
        let geometry = DrawnGeometry::polygon(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 0.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(0.0, 1.0),
        ])
        .unwrap();
        let ring = to_ring(&geometry).unwrap();

        assert_eq!(ring.len(), 5);
        assert!(is_closed(&ring));
        assert!(signed_area(&ring) > 0.0);
    }

    #[test]
    fn test_polygon_without_outline_falls_back_to_bounds() {
        let geometry =
            DrawnGeometry::new(ShapeKind::Polygon, Bounds::from_corners([0.0, 0.0], [1.0, 1.0]));
        assert_eq!(to_ring(&geometry).unwrap().len(), 5);
    }

    #[test]
    fn test_degenerate_shapes_rejected() {
        let flat =
            DrawnGeometry::new(ShapeKind::Circle, Bounds::from_corners([1.0, 1.0], [1.0, 2.0]));
        assert!(to_ring(&flat).unwrap_err().is_validation());

        let line = DrawnGeometry::polygon(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(0.0, 0.0),
        ])
        .unwrap();
        assert!(to_ring(&line).unwrap_err().is_validation());
    }
}
