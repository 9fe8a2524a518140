use rand::seq::SliceRandom;

/// Browser user agents rotated across scraped requests.
const DEFAULT_USER_AGENTS: &[&str] = &[
  "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
  "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
  "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
  "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

/// Fixed identity for API endpoints.
pub const API_USER_AGENT: &str = concat!("scour/", env!("CARGO_PKG_VERSION"));

/// How a request identifies itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityMode {
  /// Pick a browser user agent from the pool on every request
  Rotating,
  /// Always send [`API_USER_AGENT`]
  #[default]
  Fixed,
}

/// Pool of user agents to rotate through.
#[derive(Debug, Clone)]
pub struct IdentityPool {
  agents: Vec<String>,
}

impl Default for IdentityPool {
  fn default() -> Self {
    Self {
      agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
    }
  }
}

impl IdentityPool {
  /// Build a pool from configured agents, falling back to the built-in list when empty.
  pub fn new(agents: Vec<String>) -> Self {
    let agents: Vec<String> = agents
      .into_iter()
      .map(|a| a.trim().to_string())
      .filter(|a| !a.is_empty())
      .collect();

    if agents.is_empty() {
      Self::default()
    } else {
      Self { agents }
    }
  }

  pub fn user_agent(&self, mode: IdentityMode) -> &str {
    match mode {
      IdentityMode::Fixed => API_USER_AGENT,
      IdentityMode::Rotating => self
        .agents
        .choose(&mut rand::thread_rng())
        .map(String::as_str)
        .unwrap_or(API_USER_AGENT),
    }
  }
}
