pub mod chat;
pub mod geocode;
pub mod geometry;
pub mod layer;
pub mod query;

pub use chat::{
    AnalysisRequest, FollowUpRequest, Identity, Message, PersistedMessage, Role, StreamChunk,
    Transcript,
};
pub use geocode::{AddressComponents, GeocodeEntry, GeocodeKey, FALLBACK_LOCATION_LABEL};
pub use geometry::{Bounds, DrawnGeometry, LatLng, ShapeKind};
pub use layer::{Layer, LayerNames, LAYER_NAMES};
pub use query::{
    ComparisonImages, ComparisonQueryDescriptor, LayerQueryDescriptor, Period,
    StatisticsQueryDescriptor, StatisticsReport,
};
