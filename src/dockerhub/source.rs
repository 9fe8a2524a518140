use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::client::DockerHubClient;
use super::types::ImageSummary;
use crate::cache::Page;
use crate::search::PageSource;
use crate::transport::FetchError;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Docker Hub image search. Offsets map onto 1-based pages.
#[derive(Clone)]
pub struct DockerHubSource {
  client: DockerHubClient,
  page_size: usize,
}

impl DockerHubSource {
  pub fn new(client: DockerHubClient) -> Self {
    Self {
      client,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }

  /// Docker Hub caps search pages at 100.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.clamp(1, 100);
    self
  }

  pub fn client(&self) -> &DockerHubClient {
    &self.client
  }

  fn page_for(&self, offset: usize) -> usize {
    offset / self.page_size + 1
  }
}

#[async_trait]
impl PageSource for DockerHubSource {
  type Query = String;
  type Item = ImageSummary;

  fn name(&self) -> &'static str {
    "dockerhub"
  }

  fn page_size(&self) -> usize {
    self.page_size
  }

  fn request_url(&self, query: &String, offset: usize) -> String {
    self
      .client
      .search_url(query, self.page_for(offset), self.page_size)
  }

  async fn fetch_page(
    &self,
    query: &String,
    offset: usize,
    cancel: &CancellationToken,
  ) -> Result<Page<ImageSummary>, FetchError> {
    let page = self
      .client
      .search(query, self.page_for(offset), self.page_size, cancel)
      .await?;

    let fetched = Page::new(page.images).with_received(page.received);
    // A `next` link is authoritative; without one, fall back to page fill
    Ok(match page.next {
      Some(_) => fetched.with_more(true),
      None => fetched,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ResponseCache;
  use crate::search::{RetryPolicy, SearchSession, SessionState};
  use crate::store::MemoryStore;
  use crate::transport::{HttpTransport, IdentityPool};
  use mockito::Matcher;
  use std::sync::Arc;
  use std::time::Duration;

  fn source() -> DockerHubSource {
    let transport =
      HttpTransport::new(IdentityPool::default(), Duration::from_secs(5)).expect("transport");
    DockerHubSource::new(DockerHubClient::new(transport))
  }

  #[test]
  fn test_offsets_map_to_pages() {
    let source = source();
    assert!(source
      .request_url(&"nginx".to_string(), 0)
      .ends_with("?q=nginx&page=1&page_size=25"));
    assert!(source
      .request_url(&"nginx".to_string(), 25)
      .ends_with("?q=nginx&page=2&page_size=25"));
  }

  #[test]
  fn test_distinct_pages_have_distinct_urls() {
    let source = source().with_page_size(10);
    assert_ne!(
      source.request_url(&"nginx".to_string(), 0),
      source.request_url(&"nginx".to_string(), 10)
    );
  }

  fn search_body(valid: usize, next: Option<&str>) -> String {
    let mut summaries: Vec<String> = (0..valid)
      .map(|i| format!(r#"{{"name": "acme/app{i}", "slug": "acme/app{i}", "star_count": {i}}}"#))
      .collect();
    summaries.push(r#"{"slug": "acme/no-name", "star_count": "lots"}"#.to_string());
    let next = next
      .map(|n| format!(r#""{}""#, n))
      .unwrap_or_else(|| "null".to_string());
    format!(
      r#"{{"count": 100, "next": {}, "summaries": [{}]}}"#,
      next,
      summaries.join(",")
    )
  }

  #[tokio::test]
  async fn test_malformed_summary_keeps_paging_open() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/api/content/v1/products/search")
      .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
      .with_body(search_body(9, Some("https://hub.docker.com/api/content/v1/products/search?page=2")))
      .create_async()
      .await;

    let transport =
      HttpTransport::new(IdentityPool::default(), Duration::from_secs(5)).expect("transport");
    let client = DockerHubClient::new(transport).with_base_url(server.url());
    let source = Arc::new(DockerHubSource::new(client).with_page_size(10));
    let cache = ResponseCache::new(Arc::new(MemoryStore::new()));
    let mut session = SearchSession::new(source, cache, RetryPolicy::default());

    session.search("app".to_string());
    for _ in 0..200 {
      session.poll();
      if !session.is_loading() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(session.state(), &SessionState::Ready);
    assert_eq!(session.results().len(), 9);
    assert!(session.has_more());
    assert_eq!(session.offset(), 10);
    assert!(session
      .source()
      .request_url(&"app".to_string(), session.offset())
      .ends_with("page=2&page_size=10"));
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_next_link_marks_more_pages() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/api/content/v1/products/search")
      .match_query(Matcher::Any)
      .with_body(search_body(2, Some("https://hub.docker.com/next")))
      .create_async()
      .await;

    let transport =
      HttpTransport::new(IdentityPool::default(), Duration::from_secs(5)).expect("transport");
    let source =
      DockerHubSource::new(DockerHubClient::new(transport).with_base_url(server.url()));
    let page = source
      .fetch_page(&"app".to_string(), 0, &CancellationToken::new())
      .await
      .expect("page");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.received, 3);
    assert!(page.has_more(source.page_size()));
  }
}
