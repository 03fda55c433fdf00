//! Per-key async state types.

use chrono::{DateTime, Utc};

/// Snapshot of the async state for a single key.
///
/// `data` survives failed refreshes: a key whose reload errored keeps showing
/// the last good payload alongside the error (stale-while-revalidate). A key
/// may also be loading while still holding previous data or a previous error
/// (refresh-in-place).
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
  /// Last successfully loaded payload, if any.
  pub data: Option<T>,
  /// Last failure message; cleared on the next success, retained across
  /// repeated failures.
  pub error: Option<String>,
  /// True while at least one operation for this key is outstanding.
  pub is_loading: bool,
  /// When `data` was last written.
  pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for Envelope<T> {
  fn default() -> Self {
    Self {
      data: None,
      error: None,
      is_loading: false,
      last_updated: None,
    }
  }
}

impl<T> Envelope<T> {
  /// Whether the last completed operation for this key failed.
  pub fn has_error(&self) -> bool {
    self.error.is_some()
  }
}

/// Receipt for one `begin_load` call.
///
/// Every token must be settled with exactly one `succeed` or `fail`. The
/// generation ties the token to the envelope instance that issued it, so a
/// token that outlives `remove` settles as a no-op; the sequence number lets
/// the store ignore completions that a newer load has superseded.
#[derive(Debug)]
#[must_use = "each begin_load must be settled with exactly one succeed or fail"]
pub struct LoadToken {
  pub(super) key: String,
  pub(super) generation: u64,
  pub(super) seq: u64,
}

impl LoadToken {
  /// The key this token was issued for.
  pub fn key(&self) -> &str {
    &self.key
  }
}
