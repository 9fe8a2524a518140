use std::time::Duration;
use thiserror::Error;

/// Failure of a single HTTP exchange.
///
/// `RateLimited` and `Blocked` are kept apart from the generic variants so the
/// search controller can retry the first and stop on the second.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request timed out after {}s", .0.as_secs())]
  Timeout(Duration),

  #[error("request was cancelled")]
  Cancelled,

  #[error("rate limited by {host}")]
  RateLimited { host: String },

  #[error("request was blocked by bot detection")]
  Blocked,

  #[error("authentication required")]
  Unauthorized,

  #[error("unexpected HTTP {status} from {url}")]
  Status { status: u16, url: String },

  #[error("network error: {0}")]
  Network(#[source] reqwest::Error),

  #[error("failed to decode response: {0}")]
  Decode(String),
}

impl FetchError {
  /// Whether the controller should back off and try again.
  pub fn is_retryable(&self) -> bool {
    matches!(self, FetchError::RateLimited { .. })
  }
}

/// Lowercased fragments that only appear on bot-check / captcha interstitials.
const BLOCK_MARKERS: &[&str] = &[
  "id=\"gs_captcha",
  "gs_captcha_f",
  "g-recaptcha",
  "our systems have detected unusual traffic",
  "please show you're not a robot",
  "/sorry/index",
];

/// Check whether a response body is a bot-block page.
pub fn looks_blocked(body: &str) -> bool {
  let lowered = body.to_lowercase();
  BLOCK_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_captcha_form_is_blocked() {
    let body = r#"<html><body><form id="gs_captcha_f" method="get"></form></body></html>"#;
    assert!(looks_blocked(body));
  }

  #[test]
  fn test_unusual_traffic_is_blocked() {
    let body = "Our systems have detected UNUSUAL TRAFFIC from your computer network.";
    assert!(looks_blocked(body));
  }

  #[test]
  fn test_regular_page_is_not_blocked() {
    let body = r#"<div class="gs_r gs_or"><div class="gs_ri"><h3 class="gs_rt">Robots</h3></div></div>"#;
    assert!(!looks_blocked(body));
  }

  #[test]
  fn test_classification() {
    let limited = FetchError::RateLimited {
      host: "scholar.google.com".to_string(),
    };
    assert!(limited.is_retryable());
    assert!(!FetchError::Blocked.is_retryable());
    assert!(!FetchError::Timeout(Duration::from_secs(10)).is_retryable());

    let status = FetchError::Status {
      status: 500,
      url: "https://example.com".to_string(),
    };
    assert!(!status.is_retryable());
  }
}
