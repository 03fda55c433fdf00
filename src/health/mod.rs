//! Server health probing and connection diagnosis.
//!
//! Probes never hang and never return errors: every check completes within
//! its timeout and yields a classified result the caller can act on, e.g.
//! switching to placeholder data when the service is unreachable.

mod diagnose;
mod probe;

pub use diagnose::{CandidateCause, Diagnosis};
pub use probe::{
  EndpointCheck, FailureCause, HealthProbe, HealthResult, HealthStatus, DEFAULT_PROBE_TIMEOUT,
};
