//! Keyed async-state envelopes with aggregate in-flight tracking.
//!
//! This module provides a service-agnostic bookkeeping layer that:
//! - Tracks loading / error / payload / freshness per opaque string key
//! - Preserves the last good payload across failed refreshes
//! - Maintains a process-wide count of outstanding loads for global spinners
//! - Ignores completions that a newer load for the same key has superseded

mod envelope;
mod envelope_store;

pub use envelope::{Envelope, LoadToken};
pub use envelope_store::EnvelopeStore;
