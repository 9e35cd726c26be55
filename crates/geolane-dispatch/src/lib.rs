//! Geolane Dispatch — serialized, rate-limited execution of outbound calls.
//!
//! A `Dispatcher` runs submitted work one task at a time, in submission
//! order, and never starts two tasks closer together than its minimum
//! interval.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, Ticket};
