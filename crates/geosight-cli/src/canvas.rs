//! Map canvas for terminal use.
//!
//! There is no map to draw on, so the area given on the command line is
//! "drawn" by placing it on the canvas, and overlays are only recorded.

use std::sync::Mutex;

use geosight_core::models::Bounds;
use geosight_core::ports::MapCanvas;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOverlay {
    pub url: String,
    pub bounds: Bounds,
}

#[derive(Default)]
pub struct HeadlessCanvas {
    drawn: Mutex<Option<Bounds>>,
    overlays: Mutex<Vec<PlacedOverlay>>,
}

impl HeadlessCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stand-in for the user finishing a shape
    pub fn place(&self, bounds: Bounds) {
        *self.drawn.lock().unwrap_or_else(|p| p.into_inner()) = Some(bounds);
    }

    pub fn overlays(&self) -> Vec<PlacedOverlay> {
        self.overlays.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl MapCanvas for HeadlessCanvas {
    fn draw_polygon(&self) {
        tracing::debug!("Polygon tool armed");
    }

    fn draw_rectangle(&self) {
        tracing::debug!("Rectangle tool armed");
    }

    fn draw_circle(&self) {
        tracing::debug!("Circle tool armed");
    }

    fn clear_all(&self) {
        *self.drawn.lock().unwrap_or_else(|p| p.into_inner()) = None;
        self.overlays.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }

    fn add_overlay(&self, url: &str, bounds: &Bounds) {
        tracing::debug!(bbox = %bounds.to_wms_bbox(), "Overlay placed");
        self.overlays
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(PlacedOverlay { url: url.to_string(), bounds: *bounds });
    }

    fn get_bounds(&self) -> Option<Bounds> {
        *self.drawn.lock().unwrap_or_else(|p| p.into_inner())
    }
}
