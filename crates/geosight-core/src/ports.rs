//! Port trait definitions
//!
//! These traits define the external collaborators the orchestrator drives.
//! HTTP adapters live in `geosight-client`; tests substitute in-memory fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::models::{
    AddressComponents, AnalysisRequest, Bounds, ComparisonImages, ComparisonQueryDescriptor,
    FollowUpRequest, Identity, PersistedMessage, StatisticsQueryDescriptor, StatisticsReport,
    StreamChunk,
};

/// Decoded chunks of one streaming response, in arrival order.
///
/// An `Err` item means the transport failed mid-stream; no further items follow.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Map-drawing capability injected into the orchestrator
pub trait MapCanvas: Send + Sync {
    /// Arm the polygon drawing tool
    fn draw_polygon(&self);

    /// Arm the rectangle drawing tool
    fn draw_rectangle(&self);

    /// Arm the circle drawing tool
    fn draw_circle(&self);

    /// Remove every drawn shape and overlay
    fn clear_all(&self);

    /// Show a raster image stretched over `bounds`
    fn add_overlay(&self, url: &str, bounds: &Bounds);

    /// Bounds of the currently drawn shape, if any
    fn get_bounds(&self) -> Option<Bounds>;
}

/// Streaming AI analysis backend
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Open the streaming analysis of a loaded overlay
    async fn open_analysis(&self, request: &AnalysisRequest) -> Result<ChunkStream>;

    /// Open the streaming answer to a follow-up question
    async fn open_follow_up(&self, request: &FollowUpRequest) -> Result<ChunkStream>;
}

/// Comparison and statistics endpoints
#[async_trait]
pub trait RasterQueryService: Send + Sync {
    async fn compare(&self, query: &ComparisonQueryDescriptor) -> Result<ComparisonImages>;

    async fn statistics(&self, query: &StatisticsQueryDescriptor) -> Result<StatisticsReport>;
}

/// Third-party reverse geocoding
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Address hierarchy at a coordinate; empty components when nothing is known
    async fn reverse(&self, lat: f64, lng: f64) -> Result<AddressComponents>;
}

/// Remote store for saved conversations
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Create an empty session and return its id
    async fn create_session(&self, identity: &Identity, title: &str) -> Result<String>;

    async fn append_message(
        &self,
        identity: &Identity,
        session_id: &str,
        message: &PersistedMessage,
    ) -> Result<()>;
}
