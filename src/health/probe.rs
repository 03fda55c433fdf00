//! Bounded reachability checks against the data service.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::Config;

/// Ceiling for any single probe; a slower answer counts as unreachable.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal classification of one health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
  /// 2xx answer from the service.
  Reachable,
  /// The service answered, but not with a 2xx.
  Degraded,
  /// No usable answer at all.
  Unreachable,
}

/// Why a probe failed at the network level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCause {
  Timeout,
  Dns,
  Refused,
  Unknown,
}

/// Outcome of a single health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResult {
  pub status: HealthStatus,
  pub reachable: bool,
  pub latency_ms: Option<u64>,
  pub status_code: Option<u16>,
  pub cause: Option<FailureCause>,
  /// True when the signal only partially confirms reachability.
  pub limited: bool,
  pub checked_at: DateTime<Utc>,
}

impl HealthResult {
  pub(super) fn from_status(status_code: u16, latency: Duration) -> Self {
    let ok = (200..300).contains(&status_code);
    Self {
      status: if ok {
        HealthStatus::Reachable
      } else {
        HealthStatus::Degraded
      },
      reachable: ok,
      latency_ms: Some(latency.as_millis() as u64),
      status_code: Some(status_code),
      cause: None,
      limited: false,
      checked_at: Utc::now(),
    }
  }

  pub(super) fn unreachable(cause: FailureCause) -> Self {
    Self {
      status: HealthStatus::Unreachable,
      reachable: false,
      latency_ms: None,
      status_code: None,
      cause: Some(cause),
      limited: false,
      checked_at: Utc::now(),
    }
  }

  fn limited(mut self) -> Self {
    self.limited = true;
    self
  }
}

/// Availability answer for a single route.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointCheck {
  pub path: String,
  pub available: bool,
  pub status_code: Option<u16>,
}

/// Reachability prober for the data service.
///
/// Each check is a fresh run; nothing is remembered between invocations.
pub struct HealthProbe {
  http: reqwest::Client,
  base_url: Url,
  timeout: Duration,
}

impl HealthProbe {
  pub fn new(config: &Config) -> Result<Self> {
    Self::from_base_url(config.base_url()?)
  }

  /// Build a probe against an explicit base URL.
  pub fn from_base_url(base_url: Url) -> Result<Self> {
    let http = reqwest::Client::builder()
      .connect_timeout(DEFAULT_PROBE_TIMEOUT)
      .user_agent(concat!("stridelog/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to build probe client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      timeout: DEFAULT_PROBE_TIMEOUT,
    })
  }

  /// Override the per-probe timeout.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub(super) fn base_url(&self) -> &Url {
    &self.base_url
  }

  pub(super) fn timeout(&self) -> Duration {
    self.timeout
  }

  /// Probe the service base endpoint and classify the answer.
  pub async fn check_server_health(&self) -> HealthResult {
    self
      .probe(self.base_url.clone(), reqwest::Method::GET)
      .await
  }

  /// Alternate lightweight signal for when the primary check fails.
  ///
  /// A HEAD of the activities route proves transport and routing but says
  /// nothing about payload health, so the result is marked `limited`.
  pub async fn fallback_health_check(&self) -> HealthResult {
    match self.base_url.join("data/activities?limit=1") {
      Ok(url) => self.probe(url, reqwest::Method::HEAD).await.limited(),
      Err(_) => HealthResult::unreachable(FailureCause::Unknown).limited(),
    }
  }

  /// Probe one specific route, independent of the aggregate diagnosis.
  pub async fn check_endpoint(&self, path: &str) -> EndpointCheck {
    let Ok(url) = self.base_url.join(path) else {
      return EndpointCheck {
        path: path.to_string(),
        available: false,
        status_code: None,
      };
    };

    let result = self.probe(url, reqwest::Method::GET).await;
    EndpointCheck {
      path: path.to_string(),
      available: result.reachable,
      status_code: result.status_code,
    }
  }

  async fn probe(&self, url: Url, method: reqwest::Method) -> HealthResult {
    let started = Instant::now();
    let request = self
      .http
      .request(method, url)
      .timeout(self.timeout)
      .send();

    match tokio::time::timeout(self.timeout, request).await {
      Ok(Ok(response)) => {
        HealthResult::from_status(response.status().as_u16(), started.elapsed())
      }
      Ok(Err(err)) => {
        debug!("probe failed: {}", err);
        HealthResult::unreachable(classify_error(&err))
      }
      Err(_) => HealthResult::unreachable(FailureCause::Timeout),
    }
  }
}

/// Map a transport error onto a failure cause by walking its source chain.
fn classify_error(err: &reqwest::Error) -> FailureCause {
  if err.is_timeout() {
    return FailureCause::Timeout;
  }

  let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
  while let Some(current) = source {
    let text = current.to_string().to_lowercase();
    if text.contains("dns") || text.contains("lookup address") {
      return FailureCause::Dns;
    }
    if let Some(io) = current.downcast_ref::<std::io::Error>() {
      match io.kind() {
        std::io::ErrorKind::ConnectionRefused => return FailureCause::Refused,
        std::io::ErrorKind::TimedOut => return FailureCause::Timeout,
        _ => {}
      }
    }
    source = current.source();
  }

  FailureCause::Unknown
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  async fn serve_once(status_line: &'static str) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
      if let Ok((mut socket, _)) = listener.accept().await {
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let response = format!(
          "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
          status_line
        );
        let _ = socket.write_all(response.as_bytes()).await;
      }
    });

    addr
  }

  fn probe_for(addr: std::net::SocketAddr) -> HealthProbe {
    let base = Url::parse(&format!("http://{}/", addr)).expect("valid url");
    HealthProbe::from_base_url(base).expect("probe builds")
  }

  #[tokio::test]
  async fn status_200_classifies_as_reachable() {
    let addr = serve_once("200 OK").await;
    let result = probe_for(addr).check_server_health().await;

    assert_eq!(result.status, HealthStatus::Reachable);
    assert!(result.reachable);
    assert_eq!(result.status_code, Some(200));
    assert!(result.latency_ms.is_some());
    assert_eq!(result.cause, None);
  }

  #[tokio::test]
  async fn status_503_classifies_as_degraded() {
    let addr = serve_once("503 Service Unavailable").await;
    let result = probe_for(addr).check_server_health().await;

    assert_eq!(result.status, HealthStatus::Degraded);
    assert!(!result.reachable);
    assert_eq!(result.status_code, Some(503));
  }

  #[tokio::test]
  async fn refused_connection_classifies_as_unreachable() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let result = probe_for(addr).check_server_health().await;
    assert_eq!(result.status, HealthStatus::Unreachable);
    assert_eq!(result.cause, Some(FailureCause::Refused));
    assert_eq!(result.status_code, None);
  }

  #[tokio::test]
  async fn silent_server_classifies_as_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
      // Accept and hold the connection without ever answering.
      let _socket = listener.accept().await;
      tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let result = probe_for(addr)
      .with_timeout(Duration::from_millis(200))
      .check_server_health()
      .await;

    assert_eq!(result.status, HealthStatus::Unreachable);
    assert_eq!(result.cause, Some(FailureCause::Timeout));
  }

  #[tokio::test]
  async fn fallback_check_is_marked_limited() {
    let addr = serve_once("200 OK").await;
    let result = probe_for(addr).fallback_health_check().await;

    assert!(result.limited);
    assert!(result.reachable);
  }

  #[tokio::test]
  async fn endpoint_check_reports_status_code() {
    let addr = serve_once("404 Not Found").await;
    let check = probe_for(addr).check_endpoint("data/activities?limit=1").await;

    assert!(!check.available);
    assert_eq!(check.status_code, Some(404));
    assert_eq!(check.path, "data/activities?limit=1");
  }
}
