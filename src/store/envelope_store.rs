//! The envelope store: per-key state transitions and global aggregates.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use color_eyre::Result;

use super::envelope::{Envelope, LoadToken};

/// One tracked key: its public snapshot plus load bookkeeping.
#[derive(Debug)]
struct Slot<T> {
  envelope: Envelope<T>,
  /// Outstanding begin_load calls for this key.
  in_flight: u32,
  /// Sequence number of the most recently issued token.
  latest_seq: u64,
  /// Identity of this slot; recreation after remove gets a fresh one.
  generation: u64,
}

impl<T> Slot<T> {
  fn new(generation: u64) -> Self {
    Self {
      envelope: Envelope::default(),
      in_flight: 0,
      latest_seq: 0,
      generation,
    }
  }
}

#[derive(Debug)]
struct Inner<T> {
  slots: HashMap<String, Slot<T>>,
  /// Outstanding begin_load calls across all keys. The same key loaded
  /// twice concurrently counts twice.
  in_flight: u64,
  generation_source: u64,
}

/// String-keyed store of async-state envelopes.
///
/// Construct one per process or session and hand it to consumers; `clear_all`
/// tears it down. The store only does bookkeeping: it imposes no TTL, no
/// automatic invalidation, and no single-flight deduplication of concurrent
/// loads for the same key. When two refreshes for one key are in flight,
/// whichever was issued last determines the final state, regardless of
/// completion order.
///
/// All mutations run as synchronous critical sections; the internal lock is
/// never held across an await point.
pub struct EnvelopeStore<T> {
  inner: Mutex<Inner<T>>,
}

impl<T> EnvelopeStore<T> {
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(Inner {
        slots: HashMap::new(),
        in_flight: 0,
        generation_source: 0,
      }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner<T>> {
    // A poisoned lock only means a panic elsewhere mid-section; no method
    // leaves the bookkeeping half-written, so the state is still usable.
    match self.inner.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  /// Mark `key` as loading and hand back the token that must settle it.
  ///
  /// Calling twice for the same key increments the in-flight counters twice;
  /// each token must be paired with exactly one terminal call.
  pub fn begin_load(&self, key: &str) -> LoadToken {
    let mut guard = self.lock();
    let inner = &mut *guard;
    let generation_source = &mut inner.generation_source;
    let slot = inner.slots.entry(key.to_owned()).or_insert_with(|| {
      *generation_source += 1;
      Slot::new(*generation_source)
    });

    slot.latest_seq += 1;
    slot.in_flight += 1;
    slot.envelope.is_loading = true;
    inner.in_flight += 1;

    LoadToken {
      key: key.to_owned(),
      generation: slot.generation,
      seq: slot.latest_seq,
    }
  }

  /// Record a successful load: payload stored, error cleared, freshness
  /// stamped.
  ///
  /// The counters are settled unconditionally, but the envelope state is only
  /// written when the token is the latest issued for its key; a superseded
  /// completion must not clobber a newer one. Tokens whose envelope was
  /// removed in the meantime settle as no-ops.
  pub fn succeed(&self, token: LoadToken, payload: T) {
    let now = Utc::now();
    let mut inner = self.lock();
    let Some(slot) = inner.slots.get_mut(&token.key) else {
      return;
    };
    if slot.generation != token.generation {
      return;
    }

    slot.in_flight = slot.in_flight.saturating_sub(1);
    slot.envelope.is_loading = slot.in_flight > 0;
    if token.seq == slot.latest_seq {
      slot.envelope.data = Some(payload);
      slot.envelope.error = None;
      slot.envelope.last_updated = Some(now);
    }
    inner.in_flight = inner.in_flight.saturating_sub(1);
  }

  /// Record a failed load: error stored, payload left untouched.
  ///
  /// Same settling rules as `succeed`.
  pub fn fail(&self, token: LoadToken, message: impl Into<String>) {
    let mut inner = self.lock();
    let Some(slot) = inner.slots.get_mut(&token.key) else {
      return;
    };
    if slot.generation != token.generation {
      return;
    }

    slot.in_flight = slot.in_flight.saturating_sub(1);
    slot.envelope.is_loading = slot.in_flight > 0;
    if token.seq == slot.latest_seq {
      slot.envelope.error = Some(message.into());
    }
    inner.in_flight = inner.in_flight.saturating_sub(1);
  }

  /// Delete the envelope for `key`.
  ///
  /// Outstanding loads for the key are subtracted from the global counter;
  /// their tokens settle as no-ops when they eventually complete.
  pub fn remove(&self, key: &str) {
    let mut inner = self.lock();
    if let Some(slot) = inner.slots.remove(key) {
      inner.in_flight = inner.in_flight.saturating_sub(u64::from(slot.in_flight));
    }
  }

  /// Delete every envelope and reset the global aggregates.
  pub fn clear_all(&self) {
    let mut inner = self.lock();
    inner.slots.clear();
    inner.in_flight = 0;
  }

  /// Number of outstanding loads across all keys.
  pub fn in_flight(&self) -> u64 {
    self.lock().in_flight
  }

  /// Global loading flag: true iff any load is outstanding.
  pub fn is_loading(&self) -> bool {
    self.lock().in_flight > 0
  }

  /// Whether any envelope is currently loading.
  pub fn any_loading(&self) -> bool {
    self.lock().slots.values().any(|s| s.envelope.is_loading)
  }

  /// Whether any envelope holds an error.
  pub fn any_error(&self) -> bool {
    self.lock().slots.values().any(|s| s.envelope.error.is_some())
  }

  /// Every errored key with its message, sorted by key.
  pub fn errors(&self) -> Vec<(String, String)> {
    let inner = self.lock();
    let mut errors: Vec<(String, String)> = inner
      .slots
      .iter()
      .filter_map(|(key, slot)| {
        slot
          .envelope
          .error
          .clone()
          .map(|message| (key.clone(), message))
      })
      .collect();
    errors.sort();
    errors
  }
}

impl<T: Clone> EnvelopeStore<T> {
  /// Current envelope for `key`, creating the default one on first reference.
  pub fn envelope(&self, key: &str) -> Envelope<T> {
    let mut guard = self.lock();
    let inner = &mut *guard;
    let generation_source = &mut inner.generation_source;
    inner
      .slots
      .entry(key.to_owned())
      .or_insert_with(|| {
        *generation_source += 1;
        Slot::new(*generation_source)
      })
      .envelope
      .clone()
  }

  /// Run `operation` under envelope tracking for `key`.
  ///
  /// Begins a load, awaits the operation, records the outcome, and re-raises
  /// the original failure after recording it. Callers that want a default
  /// value instead of an error must wrap the operation (or this call) in
  /// `safe_call`, which is the only layer that swallows failures.
  pub async fn run<F, Fut>(&self, key: &str, operation: F) -> Result<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let token = self.begin_load(key);
    match operation().await {
      Ok(value) => {
        self.succeed(token, value.clone());
        Ok(value)
      }
      Err(err) => {
        self.fail(token, err.to_string());
        Err(err)
      }
    }
  }
}

impl<T> Default for EnvelopeStore<T> {
  fn default() -> Self {
    Self::new()
  }
}
