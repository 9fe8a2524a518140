//! Time-boxed cache of parsed result pages.
//!
//! This module provides a source-agnostic caching mechanism that:
//! - Keys pages by the fully-qualified request URL (offset and sort included)
//! - Expires entries after a fixed TTL, lazily on read or eagerly on sweep
//! - Swallows storage failures so a miss is always a safe fallback

mod key;
mod layer;
mod traits;

pub use key::{request_key, CACHE_PREFIX};
pub use layer::ResponseCache;
pub use traits::{CacheEntry, Page, Record};
