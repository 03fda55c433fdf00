//! Resilient client-side data access for the stridelog fitness service.
//!
//! The crate centers on a keyed async-state cache (`store::EnvelopeStore`)
//! with stale-while-revalidate semantics, plus the pieces around it: a
//! fallback wrapper (`safe_call`), deterministic placeholder data (`mock`),
//! a server health probe (`health`), and the HTTP client (`api`) that feeds
//! them. `data::DataLayer` wires the pieces together for callers.

pub mod api;
pub mod config;
pub mod data;
pub mod health;
pub mod mock;
pub mod safe_call;
pub mod store;
