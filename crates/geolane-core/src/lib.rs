//! Geolane Core — query model, fingerprinting, configuration, errors.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod query;

pub use config::GeocoderConfig;
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, fingerprint_scoped, Fingerprint};
pub use query::{Query, QueryValue};

/// Decoded response body returned by the remote service.
pub type Response = serde_json::Value;
