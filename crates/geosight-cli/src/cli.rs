use clap::{Args, Parser, Subcommand};
use geosight_core::models::{Bounds, LatLng, Layer, ShapeKind};
use std::path::PathBuf;

/// GeoSight - Environmental analysis of satellite imagery over a drawn area
#[derive(Parser, Debug)]
#[command(name = "geosight")]
#[command(
    about = "Environmental analysis of satellite imagery over a drawn area",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./geosight.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overlay (WMS) service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub wms_url: Option<String>,

    /// Streaming analysis service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub analysis_url: Option<String>,

    /// Transcript persistence service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub persistence_url: Option<String>,

    /// Reverse geocoding service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub geocoder_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the overlay URL for an area
    Overlay(OverlayArgs),

    /// Compare two 30-day periods of a layer
    Compare(CompareArgs),

    /// Fetch index statistics over an area
    Stats(StatsArgs),

    /// Reverse geocode a coordinate
    Geocode(GeocodeArgs),

    /// Stream an AI analysis of a loaded overlay
    Analyze(AnalyzeArgs),

    /// List the supported layers
    Layers,

    /// Show the effective configuration and where each value came from
    Config,
}

/// The area the command works on, standing in for a drawn shape
#[derive(Args, Debug, Clone)]
pub struct AreaArgs {
    /// Bounding box as south,west,north,east
    #[arg(
        long,
        value_parser = parse_bbox,
        allow_hyphen_values = true,
        required_unless_present = "polygon"
    )]
    pub bbox: Option<Bounds>,

    /// Shape drawn inside the bounding box (rectangle or circle)
    #[arg(long, value_parser = parse_shape, default_value = "rectangle")]
    pub shape: ShapeKind,

    /// Polygon outline as lat,lng pairs separated by ';'
    #[arg(long, value_parser = parse_outline, allow_hyphen_values = true, conflicts_with = "bbox")]
    pub polygon: Option<Outline>,
}

/// Vertices of a polygon given on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Outline(pub Vec<LatLng>);

#[derive(Parser, Debug)]
pub struct OverlayArgs {
    #[command(flatten)]
    pub area: AreaArgs,

    /// Layer to render (overlay id, index name or display name)
    #[arg(long, value_parser = parse_layer)]
    pub layer: Layer,

    /// Start of the date range (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub start: String,

    /// End of the date range (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub end: String,

    /// Maximum cloud coverage in percent (defaults to the configured ceiling)
    #[arg(long, allow_hyphen_values = true)]
    pub cloud: Option<i32>,
}

#[derive(Parser, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    pub area: AreaArgs,

    /// Layer to compare
    #[arg(long, value_parser = parse_layer)]
    pub layer: Layer,

    /// Start of the first period
    #[arg(long)]
    pub period1: String,

    /// Start of the second period
    #[arg(long)]
    pub period2: String,

    /// Maximum cloud coverage in percent (defaults to the configured ceiling)
    #[arg(long, allow_hyphen_values = true)]
    pub cloud: Option<i32>,
}

#[derive(Parser, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub area: AreaArgs,

    /// Indices to aggregate, comma separated (e.g. NDVI,NDWI)
    #[arg(long, value_parser = parse_layer, value_delimiter = ',', required = true)]
    pub indices: Vec<Layer>,

    /// Start date
    #[arg(long)]
    pub start: String,

    /// End date
    #[arg(long)]
    pub end: String,
}

#[derive(Parser, Debug)]
pub struct GeocodeArgs {
    /// Latitude in degrees
    #[arg(allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(allow_hyphen_values = true)]
    pub lng: f64,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub overlay: OverlayArgs,

    /// Keep the conversation open for follow-up questions
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Save the transcript to the persistence service when done
    #[arg(long)]
    pub save: bool,

    /// User to save as (falls back to GEOSIGHT_USER)
    #[arg(long)]
    pub user: Option<String>,

    /// Access token for the persistence service (falls back to GEOSIGHT_TOKEN)
    #[arg(long)]
    pub token: Option<String>,
}

fn parse_layer(s: &str) -> Result<Layer, String> {
    s.parse::<Layer>().map_err(|e| e.to_string())
}

fn parse_shape(s: &str) -> Result<ShapeKind, String> {
    match s.parse::<ShapeKind>().map_err(|e| e.to_string())? {
        ShapeKind::Polygon => Err("use --polygon to give a polygon outline".to_string()),
        shape => Ok(shape),
    }
}

fn parse_coordinates(s: &str, expected: usize) -> Result<Vec<f64>, String> {
    let values = s
        .split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(format!("expected {} comma-separated numbers, got {}", expected, values.len()));
    }
    Ok(values)
}

fn parse_bbox(s: &str) -> Result<Bounds, String> {
    let v = parse_coordinates(s, 4)?;
    let bounds = Bounds::from_corners([v[0], v[1]], [v[2], v[3]]);
    bounds.validate().map_err(|e| e.to_string())?;
    Ok(bounds)
}

fn parse_outline(s: &str) -> Result<Outline, String> {
    s.split(';')
        .filter(|vertex| !vertex.trim().is_empty())
        .map(|vertex| parse_coordinates(vertex, 2).map(|v| LatLng::new(v[0], v[1])))
        .collect::<Result<Vec<_>, _>>()
        .map(Outline)
}
