use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::cache::{Page, Record};
use crate::transport::FetchError;

/// Turns `(query, offset)` into one page of records.
///
/// The returned [`Page`] counts every element the service sent, so a record
/// that failed to decode still advances the offset and still counts toward a
/// full page.
///
/// Implemented once per remote service. The session owns pagination, caching
/// and retries; a source only knows how to fetch and parse a single page.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
  type Query: Clone + Send + Sync + 'static;
  type Item: Record;

  /// Short name used in logs and the UI.
  fn name(&self) -> &'static str;

  /// Records requested per page. A page shorter than this is the last one.
  fn page_size(&self) -> usize;

  /// Fully-qualified URL for a page; doubles as the cache identity.
  fn request_url(&self, query: &Self::Query, offset: usize) -> String;

  async fn fetch_page(
    &self,
    query: &Self::Query,
    offset: usize,
    cancel: &CancellationToken,
  ) -> Result<Page<Self::Item>, FetchError>;
}
