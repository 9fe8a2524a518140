//! Saved records, one JSON array per record kind.
//!
//! The whole array is rewritten on every mutation. An empty list is stored as
//! no key at all, so saving and unsaving the same record leaves the store as it
//! was.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::Record;
use crate::store::KvStore;

pub const BOOKMARKS_PREFIX: &str = "bookmarks:";

/// A record plus when it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRecord<T> {
  #[serde(flatten)]
  pub record: T,
  pub saved_at: DateTime<Utc>,
}

/// Bookmarks of one record kind.
pub struct BookmarkStore<T: Record> {
  store: Arc<dyn KvStore>,
  _kind: PhantomData<T>,
}

impl<T: Record> BookmarkStore<T> {
  pub fn new(store: Arc<dyn KvStore>) -> Self {
    Self {
      store,
      _kind: PhantomData,
    }
  }

  /// Storage key, e.g. `bookmarks:scholar`.
  pub fn key() -> String {
    format!("{}{}", BOOKMARKS_PREFIX, T::kind())
  }

  /// Saved records, most recent first.
  pub fn list(&self) -> Result<Vec<BookmarkRecord<T>>> {
    let key = Self::key();
    match self.store.get(&key)? {
      Some(raw) => serde_json::from_str(&raw)
        .map_err(|e| eyre!("Failed to parse bookmarks {}: {}", key, e)),
      None => Ok(Vec::new()),
    }
  }

  /// Whether a record with the same identity is saved. Read failures count as not saved.
  pub fn is_saved(&self, record: &T) -> bool {
    let id = record.record_key();
    match self.list() {
      Ok(saved) => saved.iter().any(|b| b.record.record_key() == id),
      Err(e) => {
        warn!(error = %e, "failed to read bookmarks");
        false
      }
    }
  }

  /// Save the record if it is not saved, unsave it otherwise.
  ///
  /// Returns `true` when the record is saved afterwards.
  pub fn toggle(&self, record: &T) -> Result<bool> {
    let id = record.record_key();
    let mut saved = self.list()?;

    let now_saved = match saved.iter().position(|b| b.record.record_key() == id) {
      Some(index) => {
        saved.remove(index);
        false
      }
      None => {
        saved.insert(
          0,
          BookmarkRecord {
            record: record.clone(),
            saved_at: Utc::now(),
          },
        );
        true
      }
    };

    self.write(&saved)?;
    debug!(kind = T::kind(), id = %id, saved = now_saved, "bookmark toggled");
    Ok(now_saved)
  }

  /// Unsave by identity. Returns whether anything was removed.
  pub fn remove(&self, id: &str) -> Result<bool> {
    let mut saved = self.list()?;
    let before = saved.len();
    saved.retain(|b| b.record.record_key() != id);
    if saved.len() == before {
      return Ok(false);
    }
    self.write(&saved)?;
    Ok(true)
  }

  /// Unsave everything of this kind, returning how many were removed.
  pub fn clear(&self) -> Result<usize> {
    let count = self.list().map(|saved| saved.len()).unwrap_or_default();
    self.store.remove(&Self::key())?;
    Ok(count)
  }

  fn write(&self, saved: &[BookmarkRecord<T>]) -> Result<()> {
    let key = Self::key();
    if saved.is_empty() {
      self.store.remove(&key)?;
      return Ok(());
    }
    let raw = serde_json::to_string(saved)
      .map_err(|e| eyre!("Failed to serialize bookmarks {}: {}", key, e))?;
    self.store.set(&key, &raw)
  }
}

impl<T: Record> Clone for BookmarkStore<T> {
  fn clone(&self) -> Self {
    Self::new(Arc::clone(&self.store))
  }
}
