use serde::{Deserialize, Serialize};

use crate::cache::Record;

/// Placeholder for meta fields the page did not carry.
pub const UNKNOWN: &str = "Unknown";

/// What kind of page an author link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
  Orcid,
  Academic,
  Unknown,
}

impl ProfileKind {
  /// Classify a profile URL by its shape.
  pub fn classify(url: &str) -> Self {
    let lowered = url.to_lowercase();
    if lowered.contains("orcid.org/") {
      ProfileKind::Orcid
    } else if (lowered.contains("/citations?") && lowered.contains("user="))
      || lowered.contains("researchgate.net/profile/")
      || lowered.contains("semanticscholar.org/author/")
    {
      ProfileKind::Academic
    } else {
      ProfileKind::Unknown
    }
  }
}

/// Link from a result to one of its authors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
  pub name: String,
  pub url: String,
  pub kind: ProfileKind,
}

/// One normalized Scholar result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
  pub title: String,
  /// Canonical link; identity for dedupe and bookmarks
  pub link: Option<String>,
  #[serde(default)]
  pub snippet: String,
  pub authors: String,
  pub venue: String,
  pub year: Option<u16>,
  pub cited_by: Option<u32>,
  pub pdf_link: Option<String>,
  #[serde(default)]
  pub profiles: Vec<AuthorProfile>,
}

impl Record for SearchResult {
  fn record_key(&self) -> String {
    self.link.clone().unwrap_or_else(|| self.title.clone())
  }

  fn kind() -> &'static str {
    "scholar"
  }
}
