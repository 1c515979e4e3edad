//! Error types for GeoSight

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeosightError {
    // Request building errors, raised before any network call
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    // Transport errors. Never retried; the user re-triggers explicitly.
    #[error("Request to {endpoint} failed: {reason}")]
    Network { endpoint: String, reason: String },

    #[error("Malformed stream line {line:?}: {reason}")]
    StreamParse { line: String, reason: String },

    // `{success: false}` responses, surfaced verbatim
    #[error("{message}")]
    Upstream { message: String },

    #[error("Could not save transcript: {0}")]
    Persistence(#[from] PersistenceError),

    // Chat session errors
    #[error("A response is still streaming; wait for it to finish")]
    Busy,

    #[error("Operation not allowed while the conversation is {state}")]
    InvalidState { state: String },

    // The geometry changed while the request was in flight
    #[error("Result discarded: the drawn area changed while the request was in flight")]
    Superseded,

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeosightError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    pub fn network(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network { endpoint: endpoint.into(), reason: reason.to_string() }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream { message: message.into() }
    }

    /// Whether the error was raised before anything left the process
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Reasons a transcript handoff to the persistence service can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("no authenticated identity; log in to save conversations")]
    NotAuthenticated,

    #[error("the transcript is empty; start a conversation first")]
    EmptyTranscript,

    #[error("a response is still streaming")]
    StillStreaming,

    #[error("the analysis failed; run it again before saving")]
    AnalysisFailed,

    #[error("server rejected the request: {reason}")]
    Rejected { reason: String },
}

impl From<serde_json::Error> for GeosightError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeosightError>;
