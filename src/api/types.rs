//! Domain types for the stridelog data service.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discipline of a recorded activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
  Run,
  Ride,
  Swim,
  Hike,
  Walk,
}

/// A recorded activity as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  pub id: i64,
  pub user_id: i64,
  pub title: String,
  #[serde(rename = "type")]
  pub activity_type: ActivityType,
  pub distance_km: f64,
  pub duration_min: u32,
  pub comments_count: u32,
  pub likes_count: u32,
  pub created_at: DateTime<Utc>,
}

/// Payload for recording a new activity.
#[derive(Debug, Clone, Serialize)]
pub struct NewActivity {
  pub user_id: i64,
  pub title: String,
  #[serde(rename = "type")]
  pub activity_type: ActivityType,
  pub distance_km: f64,
  pub duration_min: u32,
}

/// A comment on an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id: i64,
  pub activity_id: i64,
  pub user_id: i64,
  pub content: String,
  pub created_at: DateTime<Utc>,
}

/// Payload for posting a comment.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
  pub user_id: i64,
  pub content: String,
}

/// A friendship edge from the `friends` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
  pub user_id: i64,
  pub friend_id: i64,
  pub since: DateTime<Utc>,
}

/// A user profile from the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: i64,
  pub username: String,
  pub full_name: String,
  pub avatar_url: Option<String>,
  pub bio: Option<String>,
}

/// Aggregate statistics for one user.
///
/// The service has no statistics endpoint; these are always reduced
/// client-side from an activity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatistics {
  pub user_id: i64,
  pub total_activities: usize,
  pub total_comments: u64,
  pub total_likes: u64,
  /// How many activities of each discipline.
  pub by_type: BTreeMap<ActivityType, usize>,
}

impl UserStatistics {
  /// Reduce an activity list into its aggregate.
  pub fn from_activities(user_id: i64, activities: &[Activity]) -> Self {
    let mut by_type = BTreeMap::new();
    for activity in activities {
      *by_type.entry(activity.activity_type).or_insert(0) += 1;
    }

    Self {
      user_id,
      total_activities: activities.len(),
      total_comments: activities
        .iter()
        .map(|a| u64::from(a.comments_count))
        .sum(),
      total_likes: activities.iter().map(|a| u64::from(a.likes_count)).sum(),
      by_type,
    }
  }
}
