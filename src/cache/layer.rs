//! TTL response cache over a key-value store.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use super::key::CACHE_PREFIX;
use super::traits::{CacheEntry, EntryHeader, Page};
use crate::notify::Toast;
use crate::store::KvStore;

/// Cache of parsed result pages keyed by request.
///
/// Store failures never escape: reads degrade to a miss, writes are dropped,
/// and both are logged. The first failure is also kept as a toast for the UI
/// (see [`ResponseCache::take_failure`]); later ones are only logged.
pub struct ResponseCache {
  store: Arc<dyn KvStore>,
  /// How long an entry stays valid
  ttl: Duration,
  /// Shared by clones, so one report covers every session
  failure: Arc<FailureReport>,
}

#[derive(Default)]
struct FailureReport {
  reported: AtomicBool,
  pending: Mutex<Option<Toast>>,
}

impl FailureReport {
  fn record(&self, what: &str, error: &color_eyre::Report) {
    if self.reported.swap(true, Ordering::SeqCst) {
      return;
    }
    if let Ok(mut pending) = self.pending.lock() {
      *pending = Some(Toast::failure(
        format!("Cache {} failed", what),
        format!("{}; continuing without cache", error),
      ));
    }
  }

  fn take(&self) -> Option<Toast> {
    self.pending.lock().ok().and_then(|mut pending| pending.take())
  }
}

impl ResponseCache {
  /// One hour.
  pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

  pub fn new(store: Arc<dyn KvStore>) -> Self {
    Self {
      store,
      ttl: Self::DEFAULT_TTL,
      failure: Arc::default(),
    }
  }

  /// Set the time-to-live for cached pages.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  fn ttl_millis(&self) -> i64 {
    i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
  }

  /// Pending notice about a store failure, reported once per cache.
  pub fn take_failure(&self) -> Option<Toast> {
    self.failure.take()
  }

  /// Get a cached page. Expired or unreadable entries count as absent and are reclaimed.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<Page<T>> {
    let raw = match self.store.get(key) {
      Ok(Some(raw)) => raw,
      Ok(None) => {
        debug!(key, "cache miss");
        return None;
      }
      Err(e) => {
        warn!(key, error = %e, "cache read failed");
        self.failure.record("read", &e);
        return None;
      }
    };

    let entry: CacheEntry<Vec<T>> = match serde_json::from_str(&raw) {
      Ok(entry) => entry,
      Err(e) => {
        warn!(key, error = %e, "discarding undecodable cache entry");
        self.reclaim(key);
        return None;
      }
    };

    if !entry.is_valid(Utc::now().timestamp_millis(), self.ttl_millis()) {
      debug!(key, "cache entry expired");
      self.reclaim(key);
      return None;
    }

    debug!(key, count = entry.payload.len(), "cache hit");
    let received = entry.received.unwrap_or(entry.payload.len());
    Some(Page {
      items: entry.payload,
      received,
      more: entry.more,
    })
  }

  /// Store a page, replacing any previous entry for the key.
  pub fn set<T: Serialize>(&self, key: &str, page: &Page<T>) {
    let entry = CacheEntry {
      key: key.to_string(),
      stored_at: Utc::now().timestamp_millis(),
      payload: page.items.as_slice(),
      received: (page.received != page.items.len()).then_some(page.received),
      more: page.more,
    };

    let result = serde_json::to_string(&entry)
      .map_err(color_eyre::Report::from)
      .and_then(|raw| self.store.set(key, &raw));

    if let Err(e) = result {
      warn!(key, error = %e, "cache write failed");
      self.failure.record("write", &e);
    }
  }

  /// Remove every cached page. Always returns a toast describing the result.
  pub fn clear(&self) -> Toast {
    match self.store.remove_prefix(CACHE_PREFIX) {
      Ok(removed) => {
        debug!(removed, "cache cleared");
        Toast::success("Cache cleared").with_message(format!("{} pages removed", removed))
      }
      Err(e) => {
        warn!(error = %e, "cache clear failed");
        Toast::failure("Failed to clear cache", e.to_string())
      }
    }
  }

  /// Sweep expired pages, returning how many were removed.
  pub fn clear_expired(&self) -> usize {
    let keys = match self.store.keys_with_prefix(CACHE_PREFIX) {
      Ok(keys) => keys,
      Err(e) => {
        warn!(error = %e, "cache sweep failed");
        return 0;
      }
    };

    let now = Utc::now().timestamp_millis();
    let ttl = self.ttl_millis();
    let mut removed = 0;

    for key in keys {
      let expired = match self.store.get(&key) {
        Ok(Some(raw)) => serde_json::from_str::<EntryHeader>(&raw)
          .map(|header| now - header.timestamp >= ttl)
          .unwrap_or(true),
        Ok(None) => false,
        Err(e) => {
          warn!(key = %key, error = %e, "cache sweep read failed");
          false
        }
      };

      if expired && self.reclaim(&key) {
        removed += 1;
      }
    }

    debug!(removed, "expired cache entries swept");
    removed
  }

  fn reclaim(&self, key: &str) -> bool {
    match self.store.remove(key) {
      Ok(existed) => existed,
      Err(e) => {
        warn!(key, error = %e, "failed to reclaim cache entry");
        false
      }
    }
  }
}

impl Clone for ResponseCache {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      ttl: self.ttl,
      failure: Arc::clone(&self.failure),
    }
  }
}
