//! Fallback wrapper for operations whose failure should degrade silently.

use std::future::Future;

use color_eyre::Result;
use tracing::warn;

/// Await `operation`, returning `fallback` instead of any error.
///
/// The failure is logged and then dropped: nothing is recorded anywhere and
/// the caller never observes an `Err`. This is the opposite of
/// `EnvelopeStore::run`, which records the failure and still re-raises it.
/// The two compose in either order: `safe_call` around `run` keeps the
/// envelope's error record while guaranteeing the caller a value; `safe_call`
/// inside `run` makes the whole load register as a success with the fallback
/// payload.
pub async fn safe_call<T, F, Fut>(operation: F, fallback: T) -> T
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  match operation().await {
    Ok(value) => value,
    Err(err) => {
      warn!("operation failed, using fallback: {}", err);
      fallback
    }
  }
}

/// `safe_call` with `T::default()` as the fallback (e.g. an empty list).
pub async fn safe_call_or_default<T, F, Fut>(operation: F) -> T
where
  T: Default,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  safe_call(operation, T::default()).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::eyre::eyre;

  #[tokio::test]
  async fn resolving_operation_passes_through() {
    let value = safe_call(|| async { Ok(vec![1, 2, 3]) }, Vec::new()).await;
    assert_eq!(value, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn rejecting_operation_yields_fallback() {
    let value = safe_call(|| async { Err(eyre!("network down")) }, vec![9]).await;
    assert_eq!(value, vec![9]);
  }

  #[tokio::test]
  async fn or_default_yields_empty_value() {
    let value: Vec<i32> = safe_call_or_default(|| async { Err(eyre!("boom")) }).await;
    assert!(value.is_empty());
  }
}
