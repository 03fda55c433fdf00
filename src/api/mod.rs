//! Remote data-service boundary: domain types, wire envelope, HTTP client.

mod client;
mod types;

pub use client::{ApiClient, ApiErrorBody, ApiResponse};
pub use types::{
  Activity, ActivityType, Comment, Friend, NewActivity, NewComment, UserProfile, UserStatistics,
};

/// Collections the remote table store is expected to expose.
pub const EXPECTED_COLLECTIONS: &[&str] = &["users", "activities", "activity_comments", "friends"];
