//! Deterministic placeholder data for offline and degraded operation.
//!
//! Every function is a pure generator over a fixed activity table, so
//! repeated calls are value-equal (modulo the "now" reference used for
//! timestamps). Nothing here is ever persisted.

use chrono::{DateTime, Duration, Utc};

use crate::api::{Activity, ActivityType, UserProfile, UserStatistics};

/// Fixed activity table: title, type, distance km, duration min, comments,
/// likes. Row order is newest first.
const ACTIVITY_ROWS: &[(&str, ActivityType, f64, u32, u32, u32)] = &[
  ("Morning Run", ActivityType::Run, 5.2, 31, 2, 8),
  ("Evening Ride", ActivityType::Ride, 21.4, 58, 1, 12),
  ("Lake Swim", ActivityType::Swim, 1.5, 40, 0, 5),
  ("Trail Run", ActivityType::Run, 8.7, 52, 3, 9),
  ("Ridge Hike", ActivityType::Hike, 11.3, 164, 4, 6),
];

/// User id attached to generated activities.
const PLACEHOLDER_USER_ID: i64 = 1;

/// Deterministic activity list, most recent first.
///
/// Timestamps are offset from the current instant by whole-day multiples;
/// everything else comes from the fixed table.
pub fn default_activities() -> Vec<Activity> {
  default_activities_at(Utc::now())
}

/// Same as `default_activities`, with the reference instant pinned.
pub fn default_activities_at(now: DateTime<Utc>) -> Vec<Activity> {
  ACTIVITY_ROWS
    .iter()
    .enumerate()
    .map(|(i, &(title, activity_type, distance_km, duration_min, comments, likes))| Activity {
      id: (i + 1) as i64,
      user_id: PLACEHOLDER_USER_ID,
      title: title.to_string(),
      activity_type,
      distance_km,
      duration_min,
      comments_count: comments,
      likes_count: likes,
      created_at: now - Duration::days(i as i64),
    })
    .collect()
}

/// Default profile with the id overridden by the caller.
pub fn user_profile(user_id: i64) -> UserProfile {
  UserProfile {
    id: user_id,
    username: "athlete".to_string(),
    full_name: "Sample Athlete".to_string(),
    avatar_url: None,
    bio: Some("Placeholder profile while the service is unreachable".to_string()),
  }
}

/// Aggregate statistics, recomputed from `default_activities` on every call.
pub fn user_statistics(user_id: i64) -> UserStatistics {
  UserStatistics::from_activities(user_id, &default_activities())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn activities_are_deterministic_for_a_pinned_instant() {
    let now = Utc::now();
    assert_eq!(default_activities_at(now), default_activities_at(now));
  }

  #[test]
  fn activities_are_most_recent_first() {
    let activities = default_activities();
    for pair in activities.windows(2) {
      assert!(pair[0].created_at > pair[1].created_at);
    }
  }

  #[test]
  fn profile_id_is_overridden() {
    assert_eq!(user_profile(42).id, 42);
    assert_eq!(user_profile(42).username, user_profile(7).username);
  }

  #[test]
  fn statistics_are_idempotent() {
    assert_eq!(user_statistics(42), user_statistics(42));
  }

  #[test]
  fn statistics_cover_the_whole_activity_set() {
    let stats = user_statistics(1);
    let activities = default_activities();

    assert_eq!(stats.total_activities, activities.len());
    assert_eq!(
      stats.total_comments,
      activities.iter().map(|a| u64::from(a.comments_count)).sum::<u64>()
    );
    assert_eq!(
      stats.total_likes,
      activities.iter().map(|a| u64::from(a.likes_count)).sum::<u64>()
    );
    assert_eq!(stats.by_type.values().sum::<usize>(), activities.len());
    assert_eq!(stats.by_type.get(&ActivityType::Run), Some(&2));
  }
}
