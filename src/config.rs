use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dockerhub::{DEFAULT_PAGE_SIZE as HUB_PAGE_SIZE, HUB_API_URL};
use crate::scholar::{DEFAULT_PAGE_SIZE as SCHOLAR_PAGE_SIZE, SCHOLAR_URL};
use crate::search::RetryPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub scholar: ScholarConfig,
  pub dockerhub: DockerHubConfig,
  pub cache: CacheConfig,
  pub retry: RetryConfig,
  pub transport: TransportConfig,
  pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScholarConfig {
  pub base_url: String,
  /// Interface language sent as `hl`
  pub language: String,
  pub page_size: usize,
}

impl Default for ScholarConfig {
  fn default() -> Self {
    Self {
      base_url: SCHOLAR_URL.to_string(),
      language: "en".to_string(),
      page_size: SCHOLAR_PAGE_SIZE,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DockerHubConfig {
  pub base_url: String,
  /// Log in as this user; the secret comes from the environment
  pub username: Option<String>,
  pub page_size: usize,
}

impl Default for DockerHubConfig {
  fn default() -> Self {
    Self {
      base_url: HUB_API_URL.to_string(),
      username: None,
      page_size: HUB_PAGE_SIZE,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// Durable, survives restarts
  #[default]
  Sqlite,
  Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub backend: CacheBackend,
  pub ttl_secs: u64,
  /// Database file (defaults to the data directory)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend: CacheBackend::default(),
      ttl_secs: 60 * 60,
      path: None,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  pub max_retries: u32,
  pub base_delay_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay_ms: 1000,
    }
  }
}

impl RetryConfig {
  pub fn policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_retries: self.max_retries,
      base_delay: Duration::from_millis(self.base_delay_ms),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
  pub timeout_secs: u64,
  /// Browser identities to rotate through when scraping (built-in list if empty)
  pub user_agents: Vec<String>,
}

impl Default for TransportConfig {
  fn default() -> Self {
    Self {
      timeout_secs: 30,
      user_agents: Vec::new(),
    }
  }
}

impl TransportConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

/// Which search source a view talks to
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  #[default]
  Scholar,
  Dockerhub,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
  /// Quiet period after the last keystroke before searching
  pub debounce_ms: u64,
  pub default_source: SourceKind,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      debounce_ms: 400,
      default_source: SourceKind::default(),
    }
  }
}

impl UiConfig {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./scour.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/scour/config.yaml
  ///
  /// Without any file, every setting takes its default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("scour.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("scour").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Get the Docker Hub password or access token from environment variables.
  ///
  /// Checks SCOUR_DOCKERHUB_TOKEN first, then DOCKERHUB_TOKEN as fallback.
  pub fn dockerhub_token() -> Option<String> {
    std::env::var("SCOUR_DOCKERHUB_TOKEN")
      .or_else(|_| std::env::var("DOCKERHUB_TOKEN"))
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config = Config::parse(
      "cache:\n  backend: memory\n  ttl_secs: 60\nui:\n  default_source: dockerhub\n",
    )
    .unwrap();

    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.cache.ttl(), Duration::from_secs(60));
    assert_eq!(config.ui.default_source, SourceKind::Dockerhub);
    assert_eq!(config.ui.debounce(), Duration::from_millis(400));
    assert_eq!(config.scholar.base_url, SCHOLAR_URL);
    assert_eq!(config.retry.policy(), RetryPolicy::default());
  }

  #[test]
  fn test_empty_file_is_all_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.transport.timeout(), Duration::from_secs(30));
    assert_eq!(config.dockerhub.page_size, HUB_PAGE_SIZE);
    assert!(config.dockerhub.username.is_none());
  }

  #[test]
  fn test_unknown_backend_is_rejected() {
    assert!(Config::parse("cache:\n  backend: redis\n").is_err());
  }

  #[test]
  fn test_load_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "retry:\n  max_retries: 5\n  base_delay_ms: 10").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(
      config.retry.policy(),
      RetryPolicy {
        max_retries: 5,
        base_delay: Duration::from_millis(10),
      }
    );
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
