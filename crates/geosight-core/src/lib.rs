//! GeoSight Core - Domain models, request building, and configuration
//!
//! This crate holds the drawn-region state, the canonical request descriptors
//! derived from it, and the port traits implemented by HTTP adapters.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod request;
pub mod ring;
pub mod session;

pub use error::{GeosightError, PersistenceError, Result};
