use std::time::Duration;

/// Exponential backoff for soft failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Retries after the first attempt before giving up
  pub max_retries: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay: Duration::from_secs(1),
    }
  }
}

impl RetryPolicy {
  /// Wait before retry number `attempt` (1-based): `base * 2^attempt`.
  pub fn delay_for(&self, attempt: u32) -> Duration {
    self
      .base_delay
      .saturating_mul(2u32.saturating_pow(attempt))
  }

  /// Whether another retry is allowed after `attempt` failures.
  pub fn allows(&self, attempt: u32) -> bool {
    attempt <= self.max_retries
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_schedule() {
    let policy = RetryPolicy::default();
    let delays: Vec<Duration> = (1..=3).map(|a| policy.delay_for(a)).collect();
    assert_eq!(
      delays,
      vec![
        Duration::from_secs(2),
        Duration::from_secs(4),
        Duration::from_secs(8)
      ]
    );
    assert!(policy.allows(3));
    assert!(!policy.allows(4));
  }

  #[test]
  fn test_huge_attempts_saturate() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(64), Duration::from_secs(1).saturating_mul(u32::MAX));
  }
}
