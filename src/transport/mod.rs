//! HTTP transport shared by every search source.
//!
//! Every request carries an identity header, a hard timeout and an optional
//! cancellation token. Transport failures come back untouched as
//! [`FetchError`], except that HTTP 429 and bot-check pages are remapped to
//! `RateLimited` / `Blocked`.

mod error;
mod identity;

pub use error::{looks_blocked, FetchError};
pub use identity::{IdentityMode, IdentityPool, API_USER_AGENT};

use color_eyre::{eyre::eyre, Result};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-request knobs.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
  /// Extra headers; a `User-Agent` here replaces the pooled identity
  pub headers: Vec<(String, String)>,
  /// Overrides the transport's default timeout
  pub timeout: Option<Duration>,
  pub identity: IdentityMode,
  /// Inspect the body for captcha / bot-check markers
  pub detect_blocks: bool,
  pub cancel: Option<CancellationToken>,
}

impl FetchOptions {
  /// Options for scraping an HTML endpoint: rotating identity, block detection on.
  pub fn scraped() -> Self {
    Self {
      identity: IdentityMode::Rotating,
      detect_blocks: true,
      ..Self::default()
    }
  }

  /// Options for a JSON API endpoint: fixed identity, no block detection.
  pub fn api() -> Self {
    Self::default()
  }

  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn cancel_with(mut self, token: CancellationToken) -> Self {
    self.cancel = Some(token);
    self
  }

  fn overrides_user_agent(&self) -> bool {
    self
      .headers
      .iter()
      .any(|(name, _)| name.eq_ignore_ascii_case(header::USER_AGENT.as_str()))
  }
}

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpTransport {
  client: Client,
  identities: Arc<IdentityPool>,
  default_timeout: Duration,
}

impl HttpTransport {
  /// Timeout for non-interactive callers.
  pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

  pub fn new(identities: IdentityPool, default_timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .gzip(true)
      .deflate(true)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      identities: Arc::new(identities),
      default_timeout,
    })
  }

  /// GET a URL and return the raw body.
  pub async fn fetch_page(&self, url: &str, options: FetchOptions) -> Result<String, FetchError> {
    self.execute(Method::GET, url, None, options).await
  }

  /// GET a URL and decode the body as JSON.
  pub async fn get_json<T: DeserializeOwned>(
    &self,
    url: &str,
    options: FetchOptions,
  ) -> Result<T, FetchError> {
    let body = self.fetch_page(url, options).await?;
    decode_json(&body)
  }

  /// POST a JSON body and decode the JSON response.
  pub async fn post_json<B, T>(
    &self,
    url: &str,
    body: &B,
    options: FetchOptions,
  ) -> Result<T, FetchError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let payload = serde_json::to_vec(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let options = options.header(header::CONTENT_TYPE.as_str(), "application/json");
    let text = self
      .execute(Method::POST, url, Some(payload), options)
      .await?;
    decode_json(&text)
  }

  async fn execute(
    &self,
    method: Method,
    url: &str,
    body: Option<Vec<u8>>,
    options: FetchOptions,
  ) -> Result<String, FetchError> {
    let timeout = options.timeout.unwrap_or(self.default_timeout);
    let cancel = options.cancel.clone().unwrap_or_default();
    if cancel.is_cancelled() {
      return Err(FetchError::Cancelled);
    }

    let mut request = self.client.request(method, url).timeout(timeout);
    if !options.overrides_user_agent() {
      request = request.header(
        header::USER_AGENT,
        self.identities.user_agent(options.identity),
      );
    }
    for (name, value) in &options.headers {
      request = request.header(name.as_str(), value.as_str());
    }
    if let Some(body) = body {
      request = request.body(body);
    }

    debug!(url, identity = ?options.identity, "sending request");

    let detect_blocks = options.detect_blocks;
    let exchange = async move {
      let response = request.send().await.map_err(|e| classify(e, timeout))?;
      read_body(response, detect_blocks, timeout).await
    };

    tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        debug!(url, "request cancelled");
        Err(FetchError::Cancelled)
      }
      result = exchange => result,
    }
  }
}

async fn read_body(
  response: Response,
  detect_blocks: bool,
  timeout: Duration,
) -> Result<String, FetchError> {
  let status = response.status();
  let final_url = response.url().clone();

  if status == StatusCode::TOO_MANY_REQUESTS {
    let host = final_url.host_str().unwrap_or_default().to_string();
    warn!(host = %host, "rate limited");
    return Err(FetchError::RateLimited { host });
  }
  if status == StatusCode::UNAUTHORIZED {
    return Err(FetchError::Unauthorized);
  }
  // Google redirects flagged clients to /sorry/ before serving the captcha
  if detect_blocks && final_url.path().starts_with("/sorry") {
    warn!(url = %final_url, "redirected to bot check");
    return Err(FetchError::Blocked);
  }

  let body = response.text().await.map_err(|e| classify(e, timeout))?;

  if detect_blocks && looks_blocked(&body) {
    warn!(url = %final_url, status = status.as_u16(), "bot check page detected");
    return Err(FetchError::Blocked);
  }
  if !status.is_success() {
    return Err(FetchError::Status {
      status: status.as_u16(),
      url: final_url.to_string(),
    });
  }

  Ok(body)
}

fn classify(error: reqwest::Error, timeout: Duration) -> FetchError {
  if error.is_timeout() {
    FetchError::Timeout(timeout)
  } else {
    FetchError::Network(error)
  }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
  serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;
  use serde::Deserialize;

  fn transport() -> HttpTransport {
    HttpTransport::new(
      IdentityPool::new(vec!["test-browser".to_string()]),
      Duration::from_secs(5),
    )
    .expect("transport")
  }

  #[tokio::test]
  async fn test_fetch_page_returns_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/scholar")
      .match_query(Matcher::UrlEncoded("q".into(), "rust".into()))
      .match_header("user-agent", "test-browser")
      .with_status(200)
      .with_body("<html>ok</html>")
      .create_async()
      .await;

    let url = format!("{}/scholar?q=rust", server.url());
    let body = transport()
      .fetch_page(&url, FetchOptions::scraped())
      .await
      .expect("body");

    assert_eq!(body, "<html>ok</html>");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_api_requests_use_fixed_identity() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/v2/ping")
      .match_header("user-agent", API_USER_AGENT)
      .with_body("{}")
      .create_async()
      .await;

    let url = format!("{}/v2/ping", server.url());
    transport()
      .fetch_page(&url, FetchOptions::api())
      .await
      .expect("body");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_header_override_replaces_identity() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/")
      .match_header("user-agent", "custom-agent")
      .match_header("accept-language", "en")
      .with_body("ok")
      .create_async()
      .await;

    let options = FetchOptions::scraped()
      .header("User-Agent", "custom-agent")
      .header("Accept-Language", "en");
    transport()
      .fetch_page(&format!("{}/", server.url()), options)
      .await
      .expect("body");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_429_maps_to_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/scholar")
      .with_status(429)
      .with_body("slow down")
      .create_async()
      .await;

    let err = transport()
      .fetch_page(&format!("{}/scholar", server.url()), FetchOptions::scraped())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { .. }));
  }

  #[tokio::test]
  async fn test_captcha_body_maps_to_blocked_only_when_scraping() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/scholar")
      .with_status(200)
      .with_body(r#"<form id="gs_captcha_f"></form>"#)
      .expect(2)
      .create_async()
      .await;

    let url = format!("{}/scholar", server.url());
    let err = transport()
      .fetch_page(&url, FetchOptions::scraped())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Blocked));

    let body = transport()
      .fetch_page(&url, FetchOptions::api())
      .await
      .expect("api callers see the raw body");
    assert!(body.contains("gs_captcha_f"));
  }

  #[tokio::test]
  async fn test_server_error_surfaces_status() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/broken")
      .with_status(503)
      .with_body("maintenance")
      .create_async()
      .await;

    let err = transport()
      .fetch_page(&format!("{}/broken", server.url()), FetchOptions::api())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
  }

  #[tokio::test]
  async fn test_unauthorized_is_distinct() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/private")
      .with_status(401)
      .create_async()
      .await;

    let err = transport()
      .fetch_page(&format!("{}/private", server.url()), FetchOptions::api())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Unauthorized));
  }

  #[tokio::test]
  async fn test_cancelled_token_short_circuits() {
    let token = CancellationToken::new();
    token.cancel();

    let err = transport()
      .fetch_page(
        "http://127.0.0.1:9/never",
        FetchOptions::api().cancel_with(token),
      )
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Cancelled));
  }

  #[derive(Debug, Deserialize)]
  struct TokenResponse {
    token: String,
  }

  #[tokio::test]
  async fn test_post_json_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/v2/users/login")
      .match_header("content-type", "application/json")
      .match_body(Matcher::Json(serde_json::json!({"username": "me", "password": "pw"})))
      .with_body(r#"{"token":"abc"}"#)
      .create_async()
      .await;

    let response: TokenResponse = transport()
      .post_json(
        &format!("{}/v2/users/login", server.url()),
        &serde_json::json!({"username": "me", "password": "pw"}),
        FetchOptions::api(),
      )
      .await
      .expect("token");

    assert_eq!(response.token, "abc");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_invalid_json_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/json")
      .with_body("not json")
      .create_async()
      .await;

    let err = transport()
      .get_json::<TokenResponse>(&format!("{}/json", server.url()), FetchOptions::api())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
  }
}
