//! HTTP client for the stridelog data endpoints.

use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;

use super::types::{Activity, Comment, Friend, NewActivity, NewComment};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Machine-readable error body returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
  /// Stable error code, e.g. the relation-does-not-exist class.
  pub code: Option<String>,
  pub message: String,
}

/// Wire envelope: every endpoint answers with a `{data, error}` pair.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
  pub data: Option<T>,
  pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
  /// Fold the pair into a `Result`; `error` wins when both are present.
  pub fn into_result(self) -> Result<T> {
    if let Some(err) = self.error {
      return match err.code {
        Some(code) => Err(eyre!("{}: {}", code, err.message)),
        None => Err(eyre!("{}", err.message)),
      };
    }
    self
      .data
      .ok_or_else(|| eyre!("Response carried neither data nor error"))
  }
}

/// Async client for the data endpoints.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let api_key = Config::api_key()?;
    Self::with_credentials(config.base_url()?, &api_key, config.request_timeout())
  }

  /// Build a client against an explicit base URL and credential.
  pub fn with_credentials(base_url: Url, api_key: &str, timeout: Duration) -> Result<Self> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
      .map_err(|e| eyre!("Credential is not a valid header value: {}", e))?;
    auth.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .connect_timeout(CONNECT_TIMEOUT)
      .default_headers(headers)
      .user_agent(concat!("stridelog/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint path {}: {}", path, e))
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = self.endpoint(path)?;
    let response = self
      .http
      .get(url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;
    let envelope: ApiResponse<T> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to decode response from {}: {}", url, e))?;
    envelope.into_result()
  }

  async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
  where
    B: Serialize,
    T: DeserializeOwned,
  {
    let url = self.endpoint(path)?;
    let response = self
      .http
      .post(url.clone())
      .json(body)
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;
    let envelope: ApiResponse<T> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to decode response from {}: {}", url, e))?;
    envelope.into_result()
  }

  /// Page through the shared activity feed, newest first.
  pub async fn list_activities(&self, limit: u32, page: u32) -> Result<Vec<Activity>> {
    self
      .get_json(&format!("data/activities?limit={}&page={}", limit, page))
      .await
  }

  /// Activities recorded by one user.
  pub async fn user_activities(&self, user_id: i64) -> Result<Vec<Activity>> {
    self
      .get_json(&format!("data/users/{}/activities", user_id))
      .await
  }

  /// Record a new activity.
  pub async fn create_activity(&self, new: &NewActivity) -> Result<Activity> {
    self.post_json("data/activities", new).await
  }

  /// Post a comment on an activity.
  pub async fn add_comment(&self, activity_id: i64, new: &NewComment) -> Result<Comment> {
    self
      .post_json(&format!("data/activities/{}/comments", activity_id), new)
      .await
  }

  /// Like an activity; returns the updated record.
  pub async fn add_like(&self, activity_id: i64, user_id: i64) -> Result<Activity> {
    self
      .post_json(
        &format!("data/activities/{}/likes", activity_id),
        &serde_json::json!({ "user_id": user_id }),
      )
      .await
  }

  /// Accepted friendships of one user.
  pub async fn user_friends(&self, user_id: i64) -> Result<Vec<Friend>> {
    self
      .get_json(&format!("data/users/{}/friends", user_id))
      .await
  }

  /// Combined recent activities of a user's friends.
  pub async fn friends_activities(&self, user_id: i64) -> Result<Vec<Activity>> {
    self
      .get_json(&format!("data/users/{}/friends/activities", user_id))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn response_with_data_folds_to_ok() {
    let response: ApiResponse<Vec<i32>> =
      serde_json::from_str(r#"{"data": [1, 2], "error": null}"#).expect("valid json");
    assert_eq!(response.into_result().expect("data present"), vec![1, 2]);
  }

  #[test]
  fn response_with_error_folds_to_err() {
    let response: ApiResponse<Vec<i32>> = serde_json::from_str(
      r#"{"data": null, "error": {"code": "42P01", "message": "relation does not exist"}}"#,
    )
    .expect("valid json");

    let err = response.into_result().expect_err("error present");
    let text = err.to_string();
    assert!(text.contains("42P01"));
    assert!(text.contains("relation does not exist"));
  }

  #[test]
  fn error_wins_when_both_fields_present() {
    let response: ApiResponse<i32> =
      serde_json::from_str(r#"{"data": 1, "error": {"code": null, "message": "stale"}}"#)
        .expect("valid json");
    assert!(response.into_result().is_err());
  }

  #[test]
  fn empty_response_is_an_error() {
    let response: ApiResponse<i32> =
      serde_json::from_str(r#"{"data": null, "error": null}"#).expect("valid json");
    assert!(response.into_result().is_err());
  }
}
