use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::api_types::{ApiLoginRequest, ApiLoginResponse, ApiPage, ApiRepository, ApiTag};
use super::parser::{decode_each, parse_search, SearchPage};
use super::types::{Repository, Tag};
use crate::transport::{FetchError, FetchOptions, HttpTransport};

pub const HUB_API_URL: &str = "https://hub.docker.com";

/// Page size for the `/v2` list endpoints.
const LIST_PAGE_SIZE: usize = 100;

/// Stop following `next` after this many pages.
const MAX_PAGES: usize = 200;

#[derive(Clone)]
struct Credentials {
  username: String,
  secret: String,
}

/// Docker Hub API client
///
/// Anonymous unless credentials are set. With credentials, a session token is
/// fetched lazily and refreshed once whenever the server rejects it.
#[derive(Clone)]
pub struct DockerHubClient {
  transport: HttpTransport,
  base_url: String,
  credentials: Option<Credentials>,
  token: Arc<RwLock<Option<String>>>,
}

impl DockerHubClient {
  pub fn new(transport: HttpTransport) -> Self {
    Self {
      transport,
      base_url: HUB_API_URL.to_string(),
      credentials: None,
      token: Arc::new(RwLock::new(None)),
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  /// Log in with a username and a password or personal access token.
  pub fn with_credentials(mut self, username: impl Into<String>, secret: impl Into<String>) -> Self {
    self.credentials = Some(Credentials {
      username: username.into(),
      secret: secret.into(),
    });
    self
  }

  /// Whether private repositories can be reached at all.
  pub fn has_credentials(&self) -> bool {
    self.credentials.is_some()
  }

  /// Exchange the credentials for a session token and remember it.
  pub async fn login(&self, cancel: &CancellationToken) -> Result<String, FetchError> {
    let Some(credentials) = &self.credentials else {
      return Err(FetchError::Unauthorized);
    };

    let url = format!("{}/v2/users/login", self.base_url);
    let request = ApiLoginRequest {
      username: &credentials.username,
      password: &credentials.secret,
    };
    let response: ApiLoginResponse = self
      .transport
      .post_json(&url, &request, FetchOptions::api().cancel_with(cancel.clone()))
      .await?;

    info!(username = %credentials.username, "logged in to docker hub");
    *self.token.write().await = Some(response.token.clone());
    Ok(response.token)
  }

  pub fn search_url(&self, query: &str, page: usize, page_size: usize) -> String {
    let params = form_urlencoded::Serializer::new(String::new())
      .append_pair("q", query.trim())
      .append_pair("page", &page.max(1).to_string())
      .append_pair("page_size", &page_size.to_string())
      .finish();
    format!("{}/api/content/v1/products/search?{}", self.base_url, params)
  }

  /// One page of image search results. `page` is 1-based.
  pub async fn search(
    &self,
    query: &str,
    page: usize,
    page_size: usize,
    cancel: &CancellationToken,
  ) -> Result<SearchPage, FetchError> {
    let url = self.search_url(query, page, page_size);
    let options = FetchOptions::api().header("Search-Version", "v3");
    let body = self.authorized_get(&url, options, cancel).await?;
    parse_search(&body)
  }

  /// Every repository in a namespace, across all pages.
  pub async fn list_repositories(
    &self,
    namespace: &str,
    cancel: &CancellationToken,
  ) -> Result<Vec<Repository>, FetchError> {
    let url = format!(
      "{}/v2/repositories/{}/?page_size={}",
      self.base_url, namespace, LIST_PAGE_SIZE
    );
    self.collect_pages::<ApiRepository, Repository>(url, cancel).await
  }

  /// Every tag of a repository, across all pages.
  pub async fn list_tags(
    &self,
    namespace: &str,
    repository: &str,
    cancel: &CancellationToken,
  ) -> Result<Vec<Tag>, FetchError> {
    let url = format!(
      "{}/v2/repositories/{}/{}/tags?page_size={}",
      self.base_url, namespace, repository, LIST_PAGE_SIZE
    );
    self.collect_pages::<ApiTag, Tag>(url, cancel).await
  }

  /// Follow `next` links until the last page, a repeated cursor or the page cap.
  async fn collect_pages<A, T>(
    &self,
    first_url: String,
    cancel: &CancellationToken,
  ) -> Result<Vec<T>, FetchError>
  where
    A: DeserializeOwned,
    T: From<A>,
  {
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(first_url);

    while let Some(url) = next.take() {
      if !seen.insert(url.clone()) {
        warn!(url = %url, "pagination cursor repeated, stopping");
        break;
      }
      if seen.len() > MAX_PAGES {
        warn!(pages = MAX_PAGES, "pagination page cap reached, stopping");
        break;
      }

      let body = self.authorized_get(&url, listing_options(), cancel).await?;
      let page: ApiPage<serde_json::Value> =
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

      debug!(url = %url, count = page.results.len(), total = page.count, "fetched page");
      items.extend(
        decode_each::<A>(page.results, "list entry")
          .into_iter()
          .map(T::from),
      );
      next = page.next.filter(|next| !next.is_empty());
    }

    Ok(items)
  }

  /// GET with the session token, logging in again once if it was rejected.
  async fn authorized_get(
    &self,
    url: &str,
    options: FetchOptions,
    cancel: &CancellationToken,
  ) -> Result<String, FetchError> {
    let current = self.token.read().await.clone();
    let token = match current {
      Some(token) => Some(token),
      None if self.credentials.is_some() => Some(self.login(cancel).await?),
      None => None,
    };

    match self.get(url, options.clone(), token.as_deref(), cancel).await {
      Err(FetchError::Unauthorized) if self.credentials.is_some() => {
        warn!(url, "session token rejected, logging in again");
        *self.token.write().await = None;
        let token = self.login(cancel).await?;
        self.get(url, options, Some(&token), cancel).await
      }
      result => result,
    }
  }

  async fn get(
    &self,
    url: &str,
    options: FetchOptions,
    token: Option<&str>,
    cancel: &CancellationToken,
  ) -> Result<String, FetchError> {
    let options = match token {
      Some(token) => options.header("Authorization", format!("Bearer {}", token)),
      None => options,
    };
    self
      .transport
      .fetch_page(url, options.cancel_with(cancel.clone()))
      .await
  }
}

/// The list endpoints run in the background, so they get the short backend timeout
/// instead of the interactive one.
fn listing_options() -> FetchOptions {
  FetchOptions::api().timeout(HttpTransport::BACKEND_TIMEOUT)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transport::IdentityPool;
  use mockito::Matcher;
  use std::time::Duration;

  fn client(server: &mockito::Server) -> DockerHubClient {
    let transport =
      HttpTransport::new(IdentityPool::default(), Duration::from_secs(5)).expect("transport");
    DockerHubClient::new(transport).with_base_url(server.url())
  }

  #[tokio::test]
  async fn test_search_sends_version_header_and_paging() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/api/content/v1/products/search")
      .match_header("search-version", "v3")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("q".into(), "redis".into()),
        Matcher::UrlEncoded("page".into(), "2".into()),
        Matcher::UrlEncoded("page_size".into(), "25".into()),
      ]))
      .with_body(r#"{"count": 1, "summaries": [{"name": "redis", "filter_type": "official"}]}"#)
      .create_async()
      .await;

    let page = client(&server)
      .search("redis", 2, 25, &CancellationToken::new())
      .await
      .expect("page");

    assert_eq!(page.images.len(), 1);
    assert_eq!(page.images[0].url, "https://hub.docker.com/_/redis");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_list_tags_follows_next() {
    let mut server = mockito::Server::new_async().await;
    let second = format!("{}/v2/repositories/library/redis/tags?page=2", server.url());
    let first_mock = server
      .mock("GET", "/v2/repositories/library/redis/tags")
      .match_query(Matcher::UrlEncoded("page_size".into(), "100".into()))
      .with_body(format!(
        r#"{{"count": 3, "next": "{}", "results": [{{"name": "7"}}, {{"name": "7.2"}}]}}"#,
        second
      ))
      .create_async()
      .await;
    let second_mock = server
      .mock("GET", "/v2/repositories/library/redis/tags")
      .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
      .with_body(r#"{"count": 3, "next": null, "results": [{"name": "latest", "full_size": 42}]}"#)
      .create_async()
      .await;

    let tags = client(&server)
      .list_tags("library", "redis", &CancellationToken::new())
      .await
      .expect("tags");

    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["7", "7.2", "latest"]);
    assert_eq!(tags[2].full_size, Some(42));
    first_mock.assert_async().await;
    second_mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_repeated_cursor_stops_pagination() {
    let mut server = mockito::Server::new_async().await;
    let first = format!("{}/v2/repositories/acme/?page_size=100", server.url());
    let mock = server
      .mock("GET", "/v2/repositories/acme/")
      .match_query(Matcher::Any)
      .with_body(format!(
        r#"{{"count": 1, "next": "{}", "results": [{{"name": "api", "namespace": "acme"}}]}}"#,
        first
      ))
      .expect(1)
      .create_async()
      .await;

    let repos = client(&server)
      .list_repositories("acme", &CancellationToken::new())
      .await
      .expect("repositories");

    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name(), "acme/api");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_rejected_token_is_refreshed_once() {
    let mut server = mockito::Server::new_async().await;
    let stale = server
      .mock("GET", "/v2/repositories/me/")
      .match_query(Matcher::Any)
      .match_header("authorization", "Bearer stale")
      .with_status(401)
      .expect(1)
      .create_async()
      .await;
    let login = server
      .mock("POST", "/v2/users/login")
      .match_body(Matcher::Json(
        serde_json::json!({"username": "me", "password": "pat"}),
      ))
      .with_body(r#"{"token": "fresh"}"#)
      .expect(1)
      .create_async()
      .await;
    let fresh = server
      .mock("GET", "/v2/repositories/me/")
      .match_query(Matcher::Any)
      .match_header("authorization", "Bearer fresh")
      .with_body(r#"{"count": 0, "results": []}"#)
      .expect(1)
      .create_async()
      .await;

    let client = client(&server).with_credentials("me", "pat");
    *client.token.write().await = Some("stale".to_string());
    assert!(client.has_credentials());

    let repos = client
      .list_repositories("me", &CancellationToken::new())
      .await
      .expect("repositories");

    assert!(repos.is_empty());
    stale.assert_async().await;
    login.assert_async().await;
    fresh.assert_async().await;
  }

  #[tokio::test]
  async fn test_anonymous_unauthorized_is_returned() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/v2/repositories/private/")
      .match_query(Matcher::Any)
      .with_status(401)
      .create_async()
      .await;

    let err = client(&server)
      .list_repositories("private", &CancellationToken::new())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Unauthorized));
  }

  #[test]
  fn test_listings_use_backend_timeout() {
    let options = listing_options();
    assert_eq!(options.timeout, Some(HttpTransport::BACKEND_TIMEOUT));
    assert!(!options.detect_blocks);
  }

  #[tokio::test]
  async fn test_login_without_credentials_fails() {
    let server = mockito::Server::new_async().await;
    let err = client(&server)
      .login(&CancellationToken::new())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Unauthorized));
  }
}
