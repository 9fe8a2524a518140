//! Paginated, cached, retry-aware search over Google Scholar and Docker Hub.
//!
//! The pieces, in dependency order:
//! - [`transport`]: HTTP with identity rotation, timeouts and cancellation
//! - [`store`] and [`cache`]: a flat key-value store and the TTL response cache on top of it
//! - [`scholar`] and [`dockerhub`]: request building and response parsing per service
//! - [`search`]: the paging/retry controller that drives a [`search::PageSource`]
//! - [`bookmarks`]: saved records, persisted next to the cache

pub mod bookmarks;
pub mod cache;
pub mod config;
pub mod dockerhub;
pub mod logging;
pub mod notify;
pub mod scholar;
pub mod search;
pub mod store;
pub mod transport;
