use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::parser::parse_results;
use super::query::{SearchQuery, DEFAULT_PAGE_SIZE};
use super::types::SearchResult;
use crate::cache::Page;
use crate::search::PageSource;
use crate::transport::{FetchError, FetchOptions, HttpTransport};

pub const SCHOLAR_URL: &str = "https://scholar.google.com/scholar";

/// Google Scholar, scraped from its HTML results page.
#[derive(Clone)]
pub struct ScholarSource {
  transport: HttpTransport,
  base_url: String,
  language: String,
  page_size: usize,
}

impl ScholarSource {
  pub fn new(transport: HttpTransport) -> Self {
    Self {
      transport,
      base_url: SCHOLAR_URL.to_string(),
      language: "en".to_string(),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn with_language(mut self, language: impl Into<String>) -> Self {
    self.language = language.into();
    self
  }

  /// Scholar caps `num` at 20.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.clamp(1, 20);
    self
  }
}

#[async_trait]
impl PageSource for ScholarSource {
  type Query = SearchQuery;
  type Item = SearchResult;

  fn name(&self) -> &'static str {
    "scholar"
  }

  fn page_size(&self) -> usize {
    self.page_size
  }

  fn request_url(&self, query: &SearchQuery, offset: usize) -> String {
    query
      .with_offset(offset)
      .to_url(&self.base_url, &self.language, self.page_size)
  }

  async fn fetch_page(
    &self,
    query: &SearchQuery,
    offset: usize,
    cancel: &CancellationToken,
  ) -> Result<Page<SearchResult>, FetchError> {
    let url = self.request_url(query, offset);
    let options = FetchOptions::scraped()
      .header("Accept-Language", self.language.as_str())
      .cancel_with(cancel.clone());

    let html = self.transport.fetch_page(&url, options).await?;
    let results = parse_results(&html, &self.base_url);
    debug!(offset, count = results.len(), "scholar page fetched");
    Ok(Page::new(results))
  }
}
