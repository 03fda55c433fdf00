use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the data service, e.g. "https://api.stridelog.app"
  pub base_url: String,
  /// Request timeout in seconds (default 30)
  pub request_timeout_secs: Option<u64>,
}

impl Config {
  /// Load configuration, from `explicit_path` when given, otherwise from the
  /// first candidate location that exists (`./stridelog.yaml`, then
  /// `$XDG_CONFIG_HOME/stridelog/config.yaml`).
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = match explicit_path {
      Some(p) if p.exists() => p.to_path_buf(),
      Some(p) => return Err(eyre!("Config file not found: {}", p.display())),
      None => Self::candidate_paths()
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| {
          eyre!(
            "No configuration file found. Create one at ~/.config/stridelog/config.yaml\n\
                 See config.example.yaml for the format."
          )
        })?,
    };

    let contents = std::fs::read_to_string(&path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
    serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Locations searched when no explicit path is given, in priority order.
  fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("stridelog.yaml")];
    if let Some(config_dir) = dirs::config_dir() {
      paths.push(config_dir.join("stridelog").join("config.yaml"));
    }
    paths
  }

  /// Parsed service base URL with a trailing slash, so joins stay relative
  /// to it.
  pub fn base_url(&self) -> Result<Url> {
    let mut url = Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid base URL {}: {}", self.api.base_url, e))?;
    if !url.path().ends_with('/') {
      url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(
      self
        .api
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
    )
  }

  /// Get the data-service credential from the environment.
  ///
  /// `STRIDELOG_API_KEY` wins; `DATA_API_KEY` is accepted as a fallback.
  pub fn api_key() -> Result<String> {
    ["STRIDELOG_API_KEY", "DATA_API_KEY"]
      .iter()
      .find_map(|name| std::env::var(name).ok())
      .ok_or_else(|| {
        eyre!("API key not found. Set STRIDELOG_API_KEY or DATA_API_KEY environment variable.")
      })
  }
}

/// Decode the role claim embedded in a JWT credential.
///
/// Payload-only decode, no signature verification; diagnostics use it to
/// confirm which role a deployment's key carries.
pub fn token_role(token: &str) -> Result<String> {
  let payload = token
    .split('.')
    .nth(1)
    .ok_or_else(|| eyre!("Credential is not a JWT (expected three dot-separated parts)"))?;

  let bytes = URL_SAFE_NO_PAD
    .decode(payload)
    .map_err(|e| eyre!("Failed to decode credential payload: {}", e))?;

  let claims: serde_json::Value = serde_json::from_slice(&bytes)
    .map_err(|e| eyre!("Credential payload is not valid JSON: {}", e))?;

  claims
    .get("role")
    .and_then(|role| role.as_str())
    .map(String::from)
    .ok_or_else(|| eyre!("Credential payload carries no role claim"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
  }

  #[test]
  fn loads_yaml_config() {
    let file = write_config(
      "api:\n  base_url: https://api.example.com\n  request_timeout_secs: 5\n",
    );

    let config = Config::load(Some(file.path())).expect("config loads");
    assert_eq!(config.api.base_url, "https://api.example.com");
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
  }

  #[test]
  fn base_url_gains_trailing_slash() {
    let file = write_config("api:\n  base_url: https://api.example.com/v1\n");
    let config = Config::load(Some(file.path())).expect("config loads");

    let base = config.base_url().expect("parses");
    assert_eq!(base.path(), "/v1/");
    assert_eq!(
      base.join("data/activities").expect("joins").as_str(),
      "https://api.example.com/v1/data/activities"
    );
  }

  #[test]
  fn missing_explicit_path_is_an_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/stridelog.yaml"))).is_err());
  }

  #[test]
  fn token_role_reads_the_role_claim() {
    // Header and signature are irrelevant to the payload decode.
    let payload = URL_SAFE_NO_PAD.encode(r#"{"role":"anon","iss":"stridelog"}"#);
    let token = format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload);

    assert_eq!(token_role(&token).expect("role decodes"), "anon");
  }

  #[test]
  fn token_without_role_claim_is_an_error() {
    let payload = URL_SAFE_NO_PAD.encode(r#"{"iss":"stridelog"}"#);
    let token = format!("h.{}.s", payload);
    assert!(token_role(&token).is_err());
  }

  #[test]
  fn opaque_token_is_an_error() {
    assert!(token_role("not-a-jwt").is_err());
  }
}
