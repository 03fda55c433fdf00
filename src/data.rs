//! High-level data access: envelope-tracked fetches with graceful fallback.
//!
//! This is the layer UI code talks to. Each fetch runs under a well-known
//! envelope key, so consumers can render per-key loading and error state as
//! well as a global spinner, and the `*_or_placeholder` variants degrade to
//! mock data while still leaving the failure recorded in the envelope.

use color_eyre::Result;

use crate::api::{Activity, ApiClient, UserStatistics};
use crate::config::Config;
use crate::mock;
use crate::safe_call::safe_call;
use crate::store::EnvelopeStore;

/// Envelope key for the shared activity feed.
pub const ACTIVITIES_KEY: &str = "activities:list";

fn user_activities_key(user_id: i64) -> String {
  format!("user:{}:activities", user_id)
}

fn user_stats_key(user_id: i64) -> String {
  format!("user:{}:stats", user_id)
}

/// One client plus the envelope stores its fetches report into.
///
/// Construct once per session and share; the stores are internally
/// synchronized. Statistics have no server endpoint and are reduced
/// client-side from the user's activities.
pub struct DataLayer {
  api: ApiClient,
  pub activities: EnvelopeStore<Vec<Activity>>,
  pub statistics: EnvelopeStore<UserStatistics>,
}

impl DataLayer {
  pub fn new(config: &Config) -> Result<Self> {
    Ok(Self::with_client(ApiClient::new(config)?))
  }

  /// Build the layer around an existing client.
  pub fn with_client(api: ApiClient) -> Self {
    Self {
      api,
      activities: EnvelopeStore::new(),
      statistics: EnvelopeStore::new(),
    }
  }

  /// Refresh the shared activity feed, recording state under
  /// [`ACTIVITIES_KEY`]. Failures are recorded and re-raised.
  pub async fn refresh_activities(&self, limit: u32, page: u32) -> Result<Vec<Activity>> {
    let api = self.api.clone();
    self
      .activities
      .run(ACTIVITIES_KEY, || async move {
        api.list_activities(limit, page).await
      })
      .await
  }

  /// Refresh one user's activities under their own envelope key.
  pub async fn refresh_user_activities(&self, user_id: i64) -> Result<Vec<Activity>> {
    let api = self.api.clone();
    self
      .activities
      .run(&user_activities_key(user_id), || async move {
        api.user_activities(user_id).await
      })
      .await
  }

  /// Refresh one user's aggregate statistics.
  pub async fn refresh_user_statistics(&self, user_id: i64) -> Result<UserStatistics> {
    let api = self.api.clone();
    self
      .statistics
      .run(&user_stats_key(user_id), || async move {
        let activities = api.user_activities(user_id).await?;
        Ok(UserStatistics::from_activities(user_id, &activities))
      })
      .await
  }

  /// Like `refresh_activities`, but degrade to placeholder data instead of
  /// erroring. The failure stays recorded in the envelope, so the UI can show
  /// the placeholder feed alongside an error indicator.
  pub async fn activities_or_placeholder(&self, limit: u32, page: u32) -> Vec<Activity> {
    safe_call(
      || async { self.refresh_activities(limit, page).await },
      mock::default_activities(),
    )
    .await
  }

  /// Like `refresh_user_statistics`, degrading to placeholder statistics.
  pub async fn statistics_or_placeholder(&self, user_id: i64) -> UserStatistics {
    safe_call(
      || async { self.refresh_user_statistics(user_id).await },
      mock::user_statistics(user_id),
    )
    .await
  }
}
