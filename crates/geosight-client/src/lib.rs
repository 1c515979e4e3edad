//! GeoSight Client - HTTP adapters for the GeoSight ports
//!
//! Every remote collaborator of the orchestrator (streaming analysis, raster
//! comparison and statistics, reverse geocoding, transcript persistence) is
//! implemented here on top of `reqwest`.

pub mod analysis;
pub mod dto;
pub mod http;
pub mod nominatim;
pub mod persistence;
pub mod raster;
pub mod sse;

pub use analysis::HttpAnalysisBackend;
pub use http::ClientSettings;
pub use nominatim::NominatimGeocoder;
pub use persistence::HttpTranscriptStore;
pub use raster::HttpRasterQueryService;
pub use sse::{decode_line, decode_stream, SseDecoder};
