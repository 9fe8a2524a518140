//! Docker Hub JSON -> domain records.
//!
//! The envelope must decode; individual elements are decoded one at a time so
//! a single malformed summary is skipped instead of failing the page.

use serde::de::DeserializeOwned;
use tracing::warn;

use super::api_types::{ApiSearchResponse, ApiSummary};
use super::types::ImageSummary;
use crate::transport::FetchError;

/// A decoded search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
  pub images: Vec<ImageSummary>,
  /// Summaries in the response, malformed ones included
  pub received: usize,
  /// Total matches reported by the server
  pub count: u64,
  pub next: Option<String>,
}

pub fn parse_search(body: &str) -> Result<SearchPage, FetchError> {
  let envelope: ApiSearchResponse =
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

  let received = envelope.summaries.len();
  let images = decode_each::<ApiSummary>(envelope.summaries, "image summary")
    .into_iter()
    .map(ApiSummary::into_summary)
    .collect();

  Ok(SearchPage {
    images,
    received,
    count: envelope.count,
    next: envelope.next.filter(|next| !next.is_empty()),
  })
}

/// Decode every element on its own, dropping (and logging) the ones that fail.
pub fn decode_each<T: DeserializeOwned>(values: Vec<serde_json::Value>, what: &str) -> Vec<T> {
  values
    .into_iter()
    .enumerate()
    .filter_map(|(index, value)| match serde_json::from_value(value) {
      Ok(decoded) => Some(decoded),
      Err(e) => {
        warn!(index, error = %e, "skipping malformed {}", what);
        None
      }
    })
    .collect()
}
