//! Flat, namespaced key-value storage.
//!
//! Both the response cache (`cache:` namespace) and bookmarks (`bookmarks:`
//! namespace) sit on top of this. Values are opaque strings (JSON in practice)
//! and every write replaces the whole value.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use color_eyre::Result;

/// Trait for key-value storage backends.
pub trait KvStore: Send + Sync {
  /// Get the value stored under `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Remove `key`. Returns whether it existed.
  fn remove(&self, key: &str) -> Result<bool>;

  /// All keys starting with `prefix`.
  fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

  /// Remove every key starting with `prefix`, returning how many were removed.
  fn remove_prefix(&self, prefix: &str) -> Result<usize>;
}
