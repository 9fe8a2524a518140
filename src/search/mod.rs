//! Source-agnostic pagination, caching and retry.
//!
//! - [`PageSource`]: one page of records from one remote service
//! - [`SearchSession`]: a query's lifecycle over any source
//! - [`RetryPolicy`]: backoff schedule for rate limiting

mod retry;
mod session;
mod source;

pub use crate::cache::Page;
pub use retry::RetryPolicy;
pub use session::{
  fetch_with_retry, FetchOutcome, SearchSession, SessionState, BLOCKED_MESSAGE,
  RATE_LIMITED_MESSAGE,
};
pub use source::PageSource;
