//! Geolane Client — cached, rate-limited access to a remote geocoding service.
//!
//! `Geocoder` fingerprints each query, answers repeats from the shared
//! `ResponseCache`, and sends misses through a single-lane `Dispatcher` so
//! the remote service sees at most one request per minimum interval.
//! The network call itself sits behind the `Transport` trait; `HttpTransport`
//! is the reqwest-backed default.

pub mod completion;
pub mod context;
pub mod orchestrator;
pub mod transport;
pub mod types;
pub mod url;

pub use completion::{with_completion, Completion};
pub use context::GeocoderContext;
pub use orchestrator::{Geocoder, GeocoderBuilder};
pub use transport::{HttpTransport, Transport, TransportRequest};
pub use types::*;

pub use geolane_core::{Error, GeocoderConfig, Query, QueryValue, Response, Result};
