use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Namespace for cached pages in the key-value store.
pub const CACHE_PREFIX: &str = "cache:";

/// Derive the cache key for a fully-qualified request URL.
///
/// The URL already carries offset and sort, so distinct pages never collide.
pub fn request_key(url: &str) -> String {
  format!("{}{}", CACHE_PREFIX, URL_SAFE_NO_PAD.encode(url.as_bytes()))
}
