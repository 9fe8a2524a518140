//! Serde-deserializable types matching Docker Hub API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::types::{ImageSummary, Repository, SourceFlag, Tag};

/// Accept a JSON string or number, keeping its display form.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(serde_json::Number),
  }

  Ok(match Option::<Raw>::deserialize(deserializer)? {
    Some(Raw::Text(text)) => text,
    Some(Raw::Number(number)) => number.to_string(),
    None => String::new(),
  })
}

// ============================================================================
// Search endpoint (content API)
// ============================================================================

/// Search envelope. Summaries stay raw so each one decodes on its own.
#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub count: u64,
  pub next: Option<String>,
  #[serde(default)]
  pub summaries: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPublisher {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiSummary {
  pub name: String,
  #[serde(default)]
  pub slug: String,
  pub publisher: Option<ApiPublisher>,
  #[serde(default)]
  pub short_description: String,
  #[serde(default)]
  pub star_count: u64,
  #[serde(default, deserialize_with = "string_or_number")]
  pub pull_count: String,
  #[serde(default)]
  pub filter_type: String,
}

impl ApiSummary {
  pub fn into_summary(self) -> ImageSummary {
    let slug = if self.slug.is_empty() {
      self.name.clone()
    } else {
      self.slug
    };
    let flag = SourceFlag::from_filter_type(&self.filter_type);

    ImageSummary {
      url: flag.canonical_url(&self.name, &slug),
      name: self.name,
      slug,
      publisher: self.publisher.map(|p| p.name).unwrap_or_default(),
      description: self.short_description,
      star_count: self.star_count,
      pull_count: self.pull_count,
      flag,
    }
  }
}

// ============================================================================
// Registry API (v2)
// ============================================================================

/// Cursor-paged envelope used by every `/v2` list endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiPage<T> {
  #[serde(default)]
  pub count: u64,
  pub next: Option<String>,
  #[serde(default = "Vec::new")]
  pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRepository {
  pub name: String,
  #[serde(default)]
  pub namespace: String,
  pub description: Option<String>,
  #[serde(default)]
  pub star_count: u64,
  #[serde(default)]
  pub pull_count: u64,
  pub last_updated: Option<DateTime<Utc>>,
  #[serde(default)]
  pub is_private: bool,
}

impl From<ApiRepository> for Repository {
  fn from(repo: ApiRepository) -> Self {
    Repository {
      namespace: repo.namespace,
      name: repo.name,
      description: repo.description.unwrap_or_default(),
      star_count: repo.star_count,
      pull_count: repo.pull_count,
      last_updated: repo.last_updated,
      is_private: repo.is_private,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiTag {
  pub name: String,
  pub full_size: Option<u64>,
  pub last_updated: Option<DateTime<Utc>>,
  pub digest: Option<String>,
}

impl From<ApiTag> for Tag {
  fn from(tag: ApiTag) -> Self {
    Tag {
      name: tag.name,
      full_size: tag.full_size,
      last_updated: tag.last_updated,
      digest: tag.digest,
    }
  }
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiLoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  pub token: String,
}
