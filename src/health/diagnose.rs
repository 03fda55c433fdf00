//! Connection diagnosis: combine probe signals into ranked candidate causes.

use std::fmt;

use serde::Serialize;
use tokio::net::lookup_host;

use super::probe::{HealthProbe, HealthResult, HealthStatus};

/// Candidate explanation for a failing connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateCause {
  /// The service host does not resolve; the machine is likely offline.
  NoNetwork,
  /// The network is up but nothing answers at the service address.
  ServerDown,
  /// Something answers on the host, but not where the client expects it.
  EndpointMismatch,
  /// The service answers, with errors.
  ServiceDegraded,
}

impl fmt::Display for CandidateCause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      CandidateCause::NoNetwork => "no network connectivity",
      CandidateCause::ServerDown => "server down or unreachable",
      CandidateCause::EndpointMismatch => "endpoint path or proxy misconfiguration",
      CandidateCause::ServiceDegraded => "service responding with errors",
    };
    f.write_str(text)
  }
}

/// Combined connection diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
  /// Whether the service host resolves at all.
  pub network_online: bool,
  pub primary: HealthResult,
  /// Only run when the primary check fails.
  pub fallback: Option<HealthResult>,
  /// Ranked candidate causes; empty when the service looks healthy.
  pub causes: Vec<CandidateCause>,
}

impl HealthProbe {
  /// Run the full diagnosis: connectivity signal, primary check, fallback
  /// check when the primary fails, then rule-based cause ranking.
  pub async fn diagnose_connection(&self) -> Diagnosis {
    let network_online = self.host_resolves().await;
    let primary = self.check_server_health().await;
    let fallback = if primary.reachable {
      None
    } else {
      Some(self.fallback_health_check().await)
    };
    let causes = rank_causes(network_online, &primary, fallback.as_ref());

    Diagnosis {
      network_online,
      primary,
      fallback,
      causes,
    }
  }

  /// Runtime-level connectivity signal: can the service host be resolved.
  async fn host_resolves(&self) -> bool {
    let Some(host) = self.base_url().host_str() else {
      return false;
    };
    let port = self.base_url().port_or_known_default().unwrap_or(443);

    match tokio::time::timeout(self.timeout(), lookup_host((host, port))).await {
      Ok(Ok(mut addrs)) => addrs.next().is_some(),
      _ => false,
    }
  }
}

/// First-matching-rule ranking; no probabilistic scoring.
fn rank_causes(
  network_online: bool,
  primary: &HealthResult,
  fallback: Option<&HealthResult>,
) -> Vec<CandidateCause> {
  if primary.reachable {
    return Vec::new();
  }
  if !network_online {
    return vec![CandidateCause::NoNetwork, CandidateCause::ServerDown];
  }

  match primary.status {
    HealthStatus::Degraded => vec![CandidateCause::ServiceDegraded],
    HealthStatus::Unreachable => {
      let fallback_answers = fallback
        .map(|f| f.reachable || f.status_code.is_some())
        .unwrap_or(false);
      if fallback_answers {
        vec![
          CandidateCause::EndpointMismatch,
          CandidateCause::ServiceDegraded,
        ]
      } else {
        vec![CandidateCause::ServerDown, CandidateCause::EndpointMismatch]
      }
    }
    HealthStatus::Reachable => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::super::probe::FailureCause;
  use super::*;
  use std::time::Duration;

  fn ok(status_code: u16) -> HealthResult {
    HealthResult::from_status(status_code, Duration::from_millis(10))
  }

  fn down(cause: FailureCause) -> HealthResult {
    HealthResult::unreachable(cause)
  }

  #[test]
  fn healthy_service_has_no_causes() {
    assert!(rank_causes(true, &ok(200), None).is_empty());
  }

  #[test]
  fn offline_host_ranks_no_network_first() {
    let causes = rank_causes(false, &down(FailureCause::Dns), None);
    assert_eq!(causes[0], CandidateCause::NoNetwork);
  }

  #[test]
  fn degraded_service_ranks_service_degraded() {
    let causes = rank_causes(true, &ok(503), None);
    assert_eq!(causes, vec![CandidateCause::ServiceDegraded]);
  }

  #[test]
  fn unreachable_with_dead_fallback_ranks_server_down() {
    let causes = rank_causes(
      true,
      &down(FailureCause::Refused),
      Some(&down(FailureCause::Refused)),
    );
    assert_eq!(causes[0], CandidateCause::ServerDown);
  }

  #[test]
  fn unreachable_with_answering_fallback_ranks_endpoint_mismatch() {
    let causes = rank_causes(true, &down(FailureCause::Refused), Some(&ok(200)));
    assert_eq!(causes[0], CandidateCause::EndpointMismatch);
  }
}
