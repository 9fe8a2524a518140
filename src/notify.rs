//! Transient, user-facing notifications.

use std::time::{Duration, Instant};

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStyle {
  Success,
  Failure,
  Info,
}

/// A one-off message shown in the status bar.
#[derive(Debug, Clone)]
pub struct Toast {
  pub style: ToastStyle,
  pub title: String,
  pub message: Option<String>,
  created_at: Instant,
}

impl Toast {
  fn new(style: ToastStyle, title: impl Into<String>, message: Option<String>) -> Self {
    Self {
      style,
      title: title.into(),
      message,
      created_at: Instant::now(),
    }
  }

  pub fn success(title: impl Into<String>) -> Self {
    Self::new(ToastStyle::Success, title, None)
  }

  pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self::new(ToastStyle::Failure, title, Some(message.into()))
  }

  pub fn info(title: impl Into<String>) -> Self {
    Self::new(ToastStyle::Info, title, None)
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }

  pub fn is_expired(&self) -> bool {
    self.created_at.elapsed() >= TOAST_TTL
  }

  /// Single-line rendering: `title: message`.
  pub fn text(&self) -> String {
    match &self.message {
      Some(message) => format!("{}: {}", self.title, message),
      None => self.title.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_text_with_and_without_message() {
    assert_eq!(Toast::success("Cache cleared").text(), "Cache cleared");
    assert_eq!(
      Toast::failure("Search failed", "HTTP 500").text(),
      "Search failed: HTTP 500"
    );
  }

  #[test]
  fn test_fresh_toast_is_not_expired() {
    assert!(!Toast::info("hello").is_expired());
  }
}
