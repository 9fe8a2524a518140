//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Trait for records that can be cached and bookmarked.
///
/// Implementors must provide an identity key that is unique within a result page.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Identity of this record (e.g., canonical link, image slug)
  fn record_key(&self) -> String;

  /// Record kind for storage organization (e.g., "scholar", "dockerhub")
  fn kind() -> &'static str;
}

/// One page of parsed records plus what the response said about paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// Elements in the response, including ones that failed to decode
  pub received: usize,
  /// Explicit continuation signal (e.g. a `next` link), when the service sends one
  pub more: Option<bool>,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>) -> Self {
    Self {
      received: items.len(),
      items,
      more: None,
    }
  }

  pub fn with_received(mut self, received: usize) -> Self {
    self.received = received;
    self
  }

  pub fn with_more(mut self, more: bool) -> Self {
    self.more = Some(more);
    self
  }

  /// Whether another page follows. Without an explicit signal, only a full
  /// page implies more.
  pub fn has_more(&self, page_size: usize) -> bool {
    self.more.unwrap_or(self.received >= page_size)
  }
}

/// One cached page of parsed records.
///
/// Serialized as `{key, timestamp, data}`, plus `received` / `more` when the
/// page carried them. `P` is `Vec<T>` when reading and `&[T]` when writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<P> {
  pub key: String,
  /// Epoch millis at which the entry was written
  #[serde(rename = "timestamp")]
  pub stored_at: i64,
  #[serde(rename = "data")]
  pub payload: P,
  /// Raw element count, when it differs from the payload length
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub received: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub more: Option<bool>,
}

impl<P> CacheEntry<P> {
  /// Valid only while `now - stored_at < ttl`.
  pub fn is_valid(&self, now_millis: i64, ttl_millis: i64) -> bool {
    now_millis - self.stored_at < ttl_millis
  }
}

/// Just the timestamp of an entry, for sweeping without decoding the payload.
#[derive(Debug, Deserialize)]
pub(crate) struct EntryHeader {
  pub timestamp: i64,
}
