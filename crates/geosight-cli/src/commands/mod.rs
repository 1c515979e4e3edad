//! Command implementations

mod analyze;
mod compare;
mod config;
mod geocode;
mod layers;
mod overlay;
mod stats;

use std::sync::Arc;

use anyhow::Result;
use geosight_client::{
    ClientSettings, HttpAnalysisBackend, HttpRasterQueryService, HttpTranscriptStore,
    NominatimGeocoder,
};
use geosight_core::config::LayeredConfig;
use geosight_core::session::GeometrySessionState;
use geosight_session::{AnalysisSession, GeocodeCache, Workbench};

use crate::canvas::HeadlessCanvas;
use crate::cli::{AreaArgs, Cli, Commands, Outline};
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config_with_overrides(&cli)?;

    match cli.command {
        Commands::Overlay(args) => overlay::execute(args, &config, &output),
        Commands::Compare(args) => compare::execute(args, &config, &output).await,
        Commands::Stats(args) => stats::execute(args, &config, &output).await,
        Commands::Geocode(args) => geocode::execute(args, &config, &output).await,
        Commands::Analyze(args) => analyze::execute(args, &config, &output).await,
        Commands::Layers => layers::execute(&output),
        Commands::Config => config::execute(&config, &output),
    }
}

/// Everything a command needs, wired from the configuration
pub(crate) struct Services {
    pub canvas: Arc<HeadlessCanvas>,
    pub geocoder: Arc<GeocodeCache>,
    pub store: HttpTranscriptStore,
    pub workbench: Workbench,
}

impl Services {
    pub fn connect(config: &LayeredConfig) -> Result<Self> {
        let settings = ClientSettings::from_config(config);
        let client = settings.build()?;
        let streaming = settings.build_streaming()?;

        let canvas = Arc::new(HeadlessCanvas::new());
        let geocoder = Arc::new(GeocodeCache::new(Arc::new(NominatimGeocoder::new(
            config.geocoder_url.value.clone(),
            config.user_agent.value.clone(),
            client.clone(),
        ))));
        let raster = Arc::new(HttpRasterQueryService::new(
            config.analysis_api_url.value.clone(),
            client.clone(),
        ));
        let backend =
            Arc::new(HttpAnalysisBackend::new(config.analysis_api_url.value.clone(), streaming));
        let store = HttpTranscriptStore::new(config.persistence_api_url.value.clone(), client);

        let workbench = Workbench::new(
            Arc::new(GeometrySessionState::new()),
            canvas.clone(),
            raster,
            geocoder.clone(),
            AnalysisSession::new(backend),
            config.wms_base_url.value.clone(),
        );

        Ok(Self { canvas, geocoder, store, workbench })
    }

    /// Draw the area given on the command line
    pub fn draw(&mut self, area: &AreaArgs) -> Result<()> {
        if let Some(Outline(vertices)) = &area.polygon {
            self.workbench.begin_drawing(geosight_core::models::ShapeKind::Polygon);
            self.workbench.complete_polygon(vertices.clone())?;
        } else if let Some(bounds) = area.bbox {
            self.workbench.begin_drawing(area.shape);
            self.canvas.place(bounds);
            self.workbench.complete_from_canvas(area.shape)?;
        }

        if let Some(bounds) = self.workbench.geometry().bounds() {
            tracing::debug!(bbox = %bounds.to_wms_bbox(), "Area drawn");
        }
        Ok(())
    }
}

/// Cloud ceiling from the command line, else the configured default
pub(crate) fn cloud_ceiling(explicit: Option<i32>, config: &LayeredConfig) -> i32 {
    explicit.unwrap_or(i32::from(config.default_cloud_ceiling.value))
}
