//! GeoSight Session - Stateful orchestration on top of the core ports
//!
//! This crate owns the streamed conversation, the geocode cache and the
//! [`Workbench`] that keeps every derived result bound to the drawn region.

pub mod analysis;
pub mod chat;
pub mod geocode;
pub mod persist;
pub mod workbench;

pub use analysis::{AnalysisSession, ChatUpdate};
pub use chat::{ChatState, Generation, StreamingChatSession};
pub use geocode::GeocodeCache;
pub use persist::{save_transcript, SavedTranscript};
pub use workbench::{
    AnalyzeOutcome, ComparisonParams, ComparisonResult, LoadedOverlay, OverlayMetadata,
    OverlayParams, StatisticsParams, StatisticsResult, Workbench,
};
