//! The single active drawn region.
//!
//! Every completed drawing and every clear bumps a revision that is broadcast
//! over a `watch` channel. Consumers read the geometry at the moment of use and
//! compare revisions after each suspension point instead of holding on to a
//! bbox across an await.

use tokio::sync::watch;

use crate::models::{Bounds, DrawnGeometry, LatLng, ShapeKind};
use crate::error::Result;

/// What dependents observe on every geometry change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySnapshot {
    pub revision: u64,
    pub geometry: Option<DrawnGeometry>,
}

#[derive(Debug)]
pub struct GeometrySessionState {
    snapshot: watch::Sender<GeometrySnapshot>,
    tool: std::sync::Mutex<Option<ShapeKind>>,
}

impl Default for GeometrySessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometrySessionState {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(GeometrySnapshot::default());
        Self { snapshot, tool: std::sync::Mutex::new(None) }
    }

    /// Record the active drawing tool; existing geometry is untouched
    pub fn begin_drawing(&self, tool: ShapeKind) {
        *self.tool.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(tool);
        tracing::debug!(%tool, "Drawing started");
    }

    /// Replace the active geometry with a finished shape
    pub fn complete_drawing(&self, bounds: Bounds, shape: ShapeKind) {
        self.replace(Some(DrawnGeometry::new(shape, bounds)));
    }

    /// Replace the active geometry with a polygon whose vertices are known
    pub fn complete_polygon(&self, outline: Vec<LatLng>) -> Result<()> {
        let geometry = DrawnGeometry::polygon(outline)?;
        self.replace(Some(geometry));
        Ok(())
    }

    /// Remove the geometry and tell dependents to discard derived results
    pub fn clear(&self) {
        self.replace(None);
    }

    fn replace(&self, geometry: Option<DrawnGeometry>) {
        *self.tool.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        self.snapshot.send_modify(|snapshot| {
            snapshot.revision += 1;
            snapshot.geometry = geometry;
            tracing::debug!(
                revision = snapshot.revision,
                shape = ?snapshot.geometry.as_ref().map(|g| g.shape),
                "Geometry changed"
            );
        });
    }

    pub fn active_tool(&self) -> Option<ShapeKind> {
        *self.tool.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn has_geometry(&self) -> bool {
        self.snapshot.borrow().geometry.is_some()
    }

    pub fn current(&self) -> Option<DrawnGeometry> {
        self.snapshot.borrow().geometry.clone()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.snapshot.borrow().geometry.as_ref().map(|g| g.bounds)
    }

    pub fn revision(&self) -> u64 {
        self.snapshot.borrow().revision
    }

    pub fn snapshot(&self) -> GeometrySnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every geometry change
    pub fn subscribe(&self) -> watch::Receiver<GeometrySnapshot> {
        self.snapshot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Bounds {
        Bounds::from_corners([0.0, 0.0], [1.0, 1.0])
    }

    #[test]
    fn test_begin_drawing_keeps_geometry() {
        let state = GeometrySessionState::new();
        state.complete_drawing(unit_square(), ShapeKind::Rectangle);
        let revision = state.revision();

        state.begin_drawing(ShapeKind::Circle);
        assert_eq!(state.active_tool(), Some(ShapeKind::Circle));
        assert!(state.has_geometry());
        assert_eq!(state.revision(), revision);
    }

    #[test]
    fn test_complete_replaces_and_resets_tool() {
        let state = GeometrySessionState::new();
        state.begin_drawing(ShapeKind::Rectangle);
        state.complete_drawing(unit_square(), ShapeKind::Rectangle);
        assert_eq!(state.active_tool(), None);

        let other = Bounds::from_corners([2.0, 2.0], [3.0, 3.0]);
        state.complete_drawing(other, ShapeKind::Circle);
        let current = state.current().unwrap();
        assert_eq!(current.shape, ShapeKind::Circle);
        assert_eq!(current.bounds, other);
        assert_eq!(state.revision(), 2);
    }

    #[test]
    fn test_clear_removes_everything() {
        let state = GeometrySessionState::new();
        state.complete_drawing(unit_square(), ShapeKind::Polygon);
        state.begin_drawing(ShapeKind::Polygon);
        state.clear();

        assert!(!state.has_geometry());
        assert_eq!(state.bounds(), None);
        assert_eq!(state.active_tool(), None);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let state = GeometrySessionState::new();
        let mut rx = state.subscribe();

        state.complete_drawing(unit_square(), ShapeKind::Rectangle);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().revision, 1);

        state.clear();
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.revision, 2);
        assert!(snapshot.geometry.is_none());
    }
}
