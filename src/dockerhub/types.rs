use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Record;

pub const HUB_WEB_URL: &str = "https://hub.docker.com";

/// Who stands behind an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFlag {
  Official,
  Verified,
  Community,
}

impl SourceFlag {
  pub fn from_filter_type(filter_type: &str) -> Self {
    match filter_type {
      "official" => SourceFlag::Official,
      "verified_publisher" | "verified" => SourceFlag::Verified,
      _ => SourceFlag::Community,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SourceFlag::Official => "official",
      SourceFlag::Verified => "verified",
      SourceFlag::Community => "community",
    }
  }

  /// Web page for an image. Official images live under `/_/`, all others under `/r/`.
  pub fn canonical_url(self, name: &str, slug: &str) -> String {
    match self {
      SourceFlag::Official => format!("{}/_/{}", HUB_WEB_URL, name),
      _ => format!("{}/r/{}", HUB_WEB_URL, slug),
    }
  }
}

/// One image from a Docker Hub search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
  pub name: String,
  pub slug: String,
  pub publisher: String,
  pub description: String,
  pub star_count: u64,
  /// Display form, e.g. `1B+`
  pub pull_count: String,
  pub flag: SourceFlag,
  pub url: String,
}

impl ImageSummary {
  /// `(namespace, repository)` for the `/v2/repositories` endpoints.
  pub fn repository_path(&self) -> (String, String) {
    match self.slug.split_once('/') {
      Some((namespace, repository)) if self.flag != SourceFlag::Official => {
        (namespace.to_string(), repository.to_string())
      }
      _ => ("library".to_string(), self.name.clone()),
    }
  }
}

impl Record for ImageSummary {
  fn record_key(&self) -> String {
    self.url.clone()
  }

  fn kind() -> &'static str {
    "dockerhub"
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
  pub namespace: String,
  pub name: String,
  pub description: String,
  pub star_count: u64,
  pub pull_count: u64,
  pub last_updated: Option<DateTime<Utc>>,
  pub is_private: bool,
}

impl Repository {
  pub fn full_name(&self) -> String {
    format!("{}/{}", self.namespace, self.name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub name: String,
  pub full_size: Option<u64>,
  pub last_updated: Option<DateTime<Utc>>,
  pub digest: Option<String>,
}
