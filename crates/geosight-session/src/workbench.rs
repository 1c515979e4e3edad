//! Orchestrator boundary tying the drawn region to everything derived from it.
//!
//! Loaded overlays, comparisons, statistics and the conversation are all bound
//! to the geometry revision they were produced under. Any geometry change,
//! whoever makes it, drops them the next time the workbench is used. Requests
//! that were in flight across the change resolve to `Superseded`.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use geosight_core::models::query::DATE_FORMAT;
use geosight_core::models::{
    Bounds, ComparisonImages, ComparisonQueryDescriptor, Identity, LatLng, Layer,
    LayerQueryDescriptor, ShapeKind, StatisticsReport, Transcript,
};
use geosight_core::ports::{MapCanvas, RasterQueryService, TranscriptStore};
use geosight_core::request::LayerRequestBuilder;
use geosight_core::session::{GeometrySessionState, GeometrySnapshot};
use geosight_core::{GeosightError, Result};

use crate::analysis::{AnalysisSession, ChatUpdate};
use crate::chat::{ChatState, Generation};
use crate::geocode::GeocodeCache;
use crate::persist::{save_transcript, SavedTranscript};

/// Shown when `analyze` runs before anything was drawn
pub const WELCOME_GUIDANCE: &str = "I am here to help you analyze satellite imagery and \
environmental data! Here is what I can do:\n\n\
🛰️ **Satellite Image Analysis**\n\
- Interpret vegetation health (NDVI)\n\
- Detect water bodies (NDWI)\n\
- Analyze geological features\n\
- Assess environmental changes\n\n\
📊 **Data Interpretation**\n\
- Explain spectral index patterns\n\
- Identify anomalies and trends\n\
- Provide environmental insights\n\
- Suggest further analysis\n\n\
🗺️ **Getting Started**\n\
1. Draw an area on the map\n\
2. Load satellite data\n\
3. Ask me specific questions about the imagery\n\n\
What would you like to explore today?";

/// Shown when an area is drawn but no overlay is loaded
pub const LOAD_DATA_GUIDANCE: &str = "I can see you have drawn an area on the map, but \
no satellite data has been loaded yet. Please load satellite data first by:\n\n\
1. Selecting a data layer (NDVI, NDWI, etc.)\n\
2. Choosing a date range\n\
3. Setting the cloud coverage percentage\n\
4. Loading the layer\n\n\
Once satellite imagery is loaded, I can provide a detailed analysis of vegetation health, water \
bodies, geological features, and environmental patterns in your selected area.";

/// User-chosen parameters of a single overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayParams {
    pub layer: Layer,
    pub start: String,
    pub end: String,
    pub cloud_ceiling: i32,
}

/// Two 30-day periods of one layer, each given by its start date
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonParams {
    pub layer: Layer,
    pub period1_start: String,
    pub period2_start: String,
    pub cloud_ceiling: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsParams {
    pub indices: Vec<Layer>,
    pub start: String,
    pub end: String,
}

/// What the legend shows for a loaded overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayMetadata {
    pub layer_name: String,
    pub date_range: String,
    pub cloud_coverage: String,
}

/// The overlay currently shown, tagged with the geometry revision it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOverlay {
    pub descriptor: LayerQueryDescriptor,
    pub url: String,
    pub metadata: OverlayMetadata,
    pub revision: u64,
}

/// Before/after images of the current area
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub descriptor: ComparisonQueryDescriptor,
    pub images: ComparisonImages,
    pub period1_label: String,
    pub period2_label: String,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsResult {
    pub report: StatisticsReport,
    pub revision: u64,
}

/// How an `analyze` request was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// A stream was opened under this generation
    Started(Generation),
    /// Guidance was shown instead; nothing was sent
    Guidance,
}

/// Single owner of the geometry-bound results and the conversation.
///
/// Every accessor first reconciles with the latest geometry revision, so a
/// caller never observes results computed for a replaced area.
pub struct Workbench {
    geometry: Arc<GeometrySessionState>,
    geometry_rx: watch::Receiver<GeometrySnapshot>,
    canvas: Arc<dyn MapCanvas>,
    raster: Arc<dyn RasterQueryService>,
    geocoder: Arc<GeocodeCache>,
    analysis: AnalysisSession,
    wms_base_url: String,
    overlay: Option<LoadedOverlay>,
    comparison: Option<ComparisonResult>,
    statistics: Option<StatisticsResult>,
}

impl Workbench {
    /// Wire a workbench to the shared geometry and its collaborators
    pub fn new(
        geometry: Arc<GeometrySessionState>,
        canvas: Arc<dyn MapCanvas>,
        raster: Arc<dyn RasterQueryService>,
        geocoder: Arc<GeocodeCache>,
        analysis: AnalysisSession,
        wms_base_url: impl Into<String>,
    ) -> Self {
        // A fresh receiver has already seen the current revision
        let geometry_rx = geometry.subscribe();
        Self {
            geometry,
            geometry_rx,
            canvas,
            raster,
            geocoder,
            analysis,
            wms_base_url: wms_base_url.into(),
            overlay: None,
            comparison: None,
            statistics: None,
        }
    }

    /// Shared drawing state; other holders may change it at any time
    pub fn geometry(&self) -> &GeometrySessionState {
        &self.geometry
    }

    /// Drop everything derived from an older geometry
    fn sync_geometry(&mut self) {
        if !self.geometry_rx.has_changed().unwrap_or(false) {
            return;
        }
        let revision = self.geometry_rx.borrow_and_update().revision;
        if self.overlay.is_some() || self.comparison.is_some() || self.statistics.is_some() {
            tracing::info!(revision, "Geometry changed; discarding derived results");
        }
        self.overlay = None;
        self.comparison = None;
        self.statistics = None;
        self.analysis.reset();
    }

    fn ensure_revision(&self, revision: u64) -> Result<()> {
        if self.geometry.revision() != revision {
            tracing::warn!(
                captured = revision,
                current = self.geometry.revision(),
                "Discarding result computed for a replaced geometry"
            );
            return Err(GeosightError::Superseded);
        }
        Ok(())
    }

    /// Arm a drawing tool on the canvas
    pub fn begin_drawing(&mut self, tool: ShapeKind) {
        self.geometry.begin_drawing(tool);
        match tool {
            ShapeKind::Polygon => self.canvas.draw_polygon(),
            ShapeKind::Rectangle => self.canvas.draw_rectangle(),
            ShapeKind::Circle => self.canvas.draw_circle(),
        }
    }

    /// Record a finished rectangle or circle
    pub fn complete_drawing(&mut self, bounds: Bounds, shape: ShapeKind) -> Result<()> {
        bounds.validate()?;
        self.geometry.complete_drawing(bounds, shape);
        self.sync_geometry();
        Ok(())
    }

    /// Record a finished polygon; its bounds are derived from the outline
    pub fn complete_polygon(&mut self, outline: Vec<LatLng>) -> Result<()> {
        self.geometry.complete_polygon(outline)?;
        self.sync_geometry();
        Ok(())
    }

    /// Record whatever the canvas reports as drawn
    pub fn complete_from_canvas(&mut self, shape: ShapeKind) -> Result<Bounds> {
        let bounds = self
            .canvas
            .get_bounds()
            .ok_or_else(|| GeosightError::validation("no area drawn on the map"))?;
        self.complete_drawing(bounds, shape)?;
        Ok(bounds)
    }

    /// Remove the drawing, every overlay and the conversation
    pub fn clear(&mut self) {
        self.canvas.clear_all();
        self.geometry.clear();
        self.sync_geometry();
    }

    /// Build the overlay for the current area and show it on the canvas
    pub fn load_overlay(&mut self, params: &OverlayParams) -> Result<LoadedOverlay> {
        self.sync_geometry();
        let snapshot = self.geometry.snapshot();
        let bbox = snapshot.geometry.as_ref().map(|g| g.bounds);

        let descriptor = LayerRequestBuilder::build_overlay(
            params.layer,
            &params.start,
            &params.end,
            params.cloud_ceiling,
            bbox.as_ref(),
        )?;
        let url = descriptor.to_url(&self.wms_base_url);
        self.canvas.add_overlay(&url, &descriptor.bbox);

        let metadata = OverlayMetadata {
            layer_name: descriptor.layer.display_name().to_string(),
            date_range: format!(
                "{} to {}",
                descriptor.start_time.format(DATE_FORMAT),
                descriptor.end_time.format(DATE_FORMAT)
            ),
            cloud_coverage: format!("{}%", descriptor.cloud_ceiling),
        };
        tracing::info!(
            layer = %descriptor.layer,
            bbox = %descriptor.bbox.to_wms_bbox(),
            "Overlay loaded"
        );

        let loaded = LoadedOverlay { descriptor, url, metadata, revision: snapshot.revision };
        self.overlay = Some(loaded.clone());
        Ok(loaded)
    }

    /// Fetch two comparison images of the current area
    pub async fn load_comparison(
        &mut self,
        params: &ComparisonParams,
    ) -> Result<ComparisonResult> {
        self.sync_geometry();
        let snapshot = self.geometry.snapshot();
        let bbox = snapshot.geometry.as_ref().map(|g| g.bounds);

        let descriptor = LayerRequestBuilder::build_comparison(
            params.layer,
            &params.period1_start,
            &params.period2_start,
            params.cloud_ceiling,
            bbox.as_ref(),
        )?;
        let images = self.raster.compare(&descriptor).await?;
        self.ensure_revision(snapshot.revision)?;

        let label = |start: &chrono::DateTime<Utc>, end: &chrono::DateTime<Utc>| {
            format!("{} - {}", start.format(DATE_FORMAT), end.format(DATE_FORMAT))
        };
        let result = ComparisonResult {
            period1_label: label(&descriptor.period1.start, &descriptor.period1.end),
            period2_label: label(&descriptor.period2.start, &descriptor.period2.end),
            descriptor,
            images,
            revision: snapshot.revision,
        };
        self.comparison = Some(result.clone());
        Ok(result)
    }

    /// Fetch index statistics over the current area
    pub async fn load_statistics(&mut self, params: &StatisticsParams) -> Result<StatisticsReport> {
        self.sync_geometry();
        let snapshot = self.geometry.snapshot();

        let descriptor = LayerRequestBuilder::build_statistics(
            &params.indices,
            &params.start,
            &params.end,
            snapshot.geometry.as_ref(),
        )?;
        let report = self.raster.statistics(&descriptor).await?;
        self.ensure_revision(snapshot.revision)?;

        self.statistics = Some(StatisticsResult {
            report: report.clone(),
            revision: snapshot.revision,
        });
        Ok(report)
    }

    /// The loaded overlay, if it still matches the drawn area
    pub fn overlay(&mut self) -> Option<&LoadedOverlay> {
        self.sync_geometry();
        self.overlay.as_ref()
    }

    /// The last comparison, if it still matches the drawn area
    pub fn comparison(&mut self) -> Option<&ComparisonResult> {
        self.sync_geometry();
        self.comparison.as_ref()
    }

    /// The last statistics report, if it still matches the drawn area
    pub fn statistics(&mut self) -> Option<&StatisticsResult> {
        self.sync_geometry();
        self.statistics.as_ref()
    }

    /// Start the AI analysis of the loaded overlay, or explain what is missing
    pub async fn analyze(&mut self) -> Result<AnalyzeOutcome> {
        self.sync_geometry();
        let snapshot = self.geometry.snapshot();

        let Some(geometry) = snapshot.geometry else {
            self.analysis.seed(WELCOME_GUIDANCE);
            return Ok(AnalyzeOutcome::Guidance);
        };
        let Some(overlay) = self.overlay.clone() else {
            self.analysis.seed(LOAD_DATA_GUIDANCE);
            return Ok(AnalyzeOutcome::Guidance);
        };

        let center = geometry.bounds.center();
        let location = self.geocoder.lookup(center.lat, center.lng).await;
        self.ensure_revision(snapshot.revision)?;

        let request =
            LayerRequestBuilder::build_analysis(&overlay.descriptor, &self.wms_base_url, &location);
        Ok(AnalyzeOutcome::Started(self.analysis.start_analysis(request)))
    }

    /// Ask a question about the settled answer
    pub fn follow_up(&mut self, text: &str) -> Result<Generation> {
        self.sync_geometry();
        self.analysis.send_follow_up(text)
    }

    /// Stop the running stream; `false` when nothing was streaming
    pub fn cancel_stream(&mut self) -> bool {
        self.analysis.cancel()
    }

    /// Next rendered effect of the running stream, `None` once it stopped
    pub async fn next_update(&mut self) -> Option<ChatUpdate> {
        self.analysis.next_update().await
    }

    /// Drive the running stream to its end and report the final state
    pub async fn wait_settled(&mut self) -> ChatState {
        self.analysis.wait_settled().await
    }

    /// Current state of the conversation
    pub fn chat_state(&self) -> ChatState {
        self.analysis.state()
    }

    /// Messages of the conversation so far
    pub fn transcript(&self) -> &Transcript {
        self.analysis.transcript()
    }

    /// Hand the settled conversation to the transcript store
    pub async fn save_transcript(
        &mut self,
        store: &dyn TranscriptStore,
        identity: Option<&Identity>,
    ) -> Result<SavedTranscript> {
        self.sync_geometry();
        save_transcript(
            store,
            identity,
            self.analysis.transcript(),
            self.analysis.state(),
            Utc::now(),
        )
        .await
    }
}
