//! Geolane Cache — bounded response cache keyed by query fingerprint.
//!
//! Entries are evicted least-recently-used first once the cache is full,
//! and expire lazily: an entry older than the TTL is dropped the next time
//! it is looked up.

pub mod cache;

pub use cache::{CacheStats, ResponseCache};
