//! Paginated search state machine.
//!
//! A `SearchSession` owns one query at a time. Network work runs on spawned
//! tasks and reports back over a channel; the UI calls [`SearchSession::poll`]
//! on every tick, the same way it would poll any other async query.
//!
//! ```ignore
//! let mut session = SearchSession::new(Arc::new(source), cache, RetryPolicy::default());
//! session.search(query);
//!
//! // In event loop tick
//! if session.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::retry::RetryPolicy;
use super::source::PageSource;
use crate::cache::{request_key, Page, Record, ResponseCache};
use crate::notify::Toast;
use crate::transport::FetchError;

pub const BLOCKED_MESSAGE: &str =
  "The server is asking for a bot check. Open the search in a browser, then retry.";

pub const RATE_LIMITED_MESSAGE: &str =
  "Still rate limited after several retries. Wait a while or change network, then retry.";

/// Where the current query stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
  /// No query yet
  Idle,
  /// A page request is in flight
  Fetching,
  /// Backing off after a soft failure
  Retrying { attempt: u32, delay: Duration },
  /// At least one record is available
  Ready,
  /// The first page came back with nothing
  Empty,
  /// Terminal for the query until a manual retry
  Blocked(String),
  Failed(String),
}

/// Result of fetching a single page, retries included.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
  Page(Page<T>),
  Blocked(String),
  Failed(String),
  Cancelled,
}

enum Event<T> {
  Retrying { attempt: u32, delay: Duration },
  Finished(FetchOutcome<T>),
}

struct Message<T> {
  generation: u64,
  offset: usize,
  event: Event<T>,
}

/// Fetch one page: cache first, then the source with exponential backoff.
///
/// `on_retry` is told about every backoff before it starts. Backoff sleeps and
/// transport calls both end early when `cancel` fires.
pub async fn fetch_with_retry<S, F>(
  source: &S,
  cache: &ResponseCache,
  policy: RetryPolicy,
  query: &S::Query,
  offset: usize,
  cancel: &CancellationToken,
  mut on_retry: F,
) -> FetchOutcome<S::Item>
where
  S: PageSource,
  F: FnMut(u32, Duration) + Send,
{
  let url = source.request_url(query, offset);
  let key = request_key(&url);

  if let Some(page) = cached_page::<S::Item>(cache, &key).await {
    debug!(source = source.name(), offset, count = page.items.len(), "serving page from cache");
    return FetchOutcome::Page(page);
  }

  let mut attempt = 0;
  loop {
    match source.fetch_page(query, offset, cancel).await {
      Ok(page) => {
        store_page(cache, &key, &page).await;
        return FetchOutcome::Page(page);
      }
      Err(FetchError::Cancelled) => return FetchOutcome::Cancelled,
      Err(e) if e.is_retryable() => {
        attempt += 1;
        if !policy.allows(attempt) {
          warn!(source = source.name(), attempts = attempt, "giving up after repeated rate limiting");
          return FetchOutcome::Blocked(RATE_LIMITED_MESSAGE.to_string());
        }

        let delay = policy.delay_for(attempt);
        warn!(source = source.name(), attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
        on_retry(attempt, delay);

        tokio::select! {
          biased;
          _ = cancel.cancelled() => return FetchOutcome::Cancelled,
          _ = tokio::time::sleep(delay) => {}
        }
      }
      Err(FetchError::Blocked) => {
        warn!(source = source.name(), url = %url, "blocked by bot check");
        return FetchOutcome::Blocked(BLOCKED_MESSAGE.to_string());
      }
      Err(e) => {
        error!(source = source.name(), url = %url, error = %e, "search failed");
        return FetchOutcome::Failed(e.to_string());
      }
    }
  }
}

// The durable store is synchronous SQLite; keep it off the async workers.
async fn cached_page<T: Record>(cache: &ResponseCache, key: &str) -> Option<Page<T>> {
  let cache = cache.clone();
  let key = key.to_string();
  tokio::task::spawn_blocking(move || cache.get::<T>(&key))
    .await
    .unwrap_or_else(|e| {
      warn!(error = %e, "cache read task failed");
      None
    })
}

async fn store_page<T: Record>(cache: &ResponseCache, key: &str, page: &Page<T>) {
  let cache = cache.clone();
  let key = key.to_string();
  let page = page.clone();
  if let Err(e) = tokio::task::spawn_blocking(move || cache.set(&key, &page)).await {
    warn!(error = %e, "cache write task failed");
  }
}

/// One query's pagination, retries and accumulated results.
pub struct SearchSession<S: PageSource> {
  source: Arc<S>,
  cache: ResponseCache,
  policy: RetryPolicy,
  query: Option<S::Query>,
  state: SessionState,
  results: Vec<S::Item>,
  seen: HashSet<String>,
  offset: usize,
  has_more: bool,
  generation: u64,
  cancel: CancellationToken,
  sender: mpsc::UnboundedSender<Message<S::Item>>,
  receiver: mpsc::UnboundedReceiver<Message<S::Item>>,
  toast: Option<Toast>,
}

impl<S: PageSource> SearchSession<S> {
  pub fn new(source: Arc<S>, cache: ResponseCache, policy: RetryPolicy) -> Self {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      source,
      cache,
      policy,
      query: None,
      state: SessionState::Idle,
      results: Vec::new(),
      seen: HashSet::new(),
      offset: 0,
      has_more: false,
      generation: 0,
      cancel: CancellationToken::new(),
      sender,
      receiver,
      toast: None,
    }
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn query(&self) -> Option<&S::Query> {
    self.query.as_ref()
  }

  pub fn results(&self) -> &[S::Item] {
    &self.results
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  /// Offset of the next page.
  pub fn offset(&self) -> usize {
    self.offset
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn is_loading(&self) -> bool {
    matches!(
      self.state,
      SessionState::Fetching | SessionState::Retrying { .. }
    )
  }

  /// Start a new query, superseding anything in flight.
  pub fn search(&mut self, query: S::Query) {
    self.supersede();
    self.query = Some(query);
    self.start_fetch();
  }

  /// Fetch the next page of the current query, if there is one.
  ///
  /// No-op while loading, after the last page, or once blocked.
  pub fn load_more(&mut self) -> bool {
    if !self.has_more || self.state != SessionState::Ready {
      return false;
    }
    self.start_fetch();
    true
  }

  /// Re-issue the current query from the first page.
  pub fn retry(&mut self) -> bool {
    match self.query.clone() {
      Some(query) => {
        info!(source = self.source.name(), "manual retry");
        self.search(query);
        true
      }
      None => false,
    }
  }

  /// Drop the query and every result.
  pub fn reset(&mut self) {
    self.supersede();
    self.query = None;
    self.state = SessionState::Idle;
  }

  /// Remove every cached page for every source sharing this cache.
  pub fn clear_cache(&self) -> Toast {
    self.cache.clear()
  }

  /// Take the pending toast, if any. Cache failures are reported here too.
  pub fn take_toast(&mut self) -> Option<Toast> {
    self.toast.take().or_else(|| self.cache.take_failure())
  }

  /// Apply results from finished tasks. Returns `true` if anything changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Ok(message) = self.receiver.try_recv() {
      if message.generation != self.generation {
        debug!(
          stale = message.generation,
          current = self.generation,
          "discarding superseded result"
        );
        continue;
      }

      match message.event {
        Event::Retrying { attempt, delay } => {
          self.state = SessionState::Retrying { attempt, delay };
        }
        Event::Finished(outcome) => self.finish(message.offset, outcome),
      }
      changed = true;
    }

    changed
  }

  fn finish(&mut self, offset: usize, outcome: FetchOutcome<S::Item>) {
    match outcome {
      FetchOutcome::Page(page) => {
        // Skipped elements still occupy their slot in the remote listing
        let received = page.received;
        self.offset = offset + received;
        self.has_more = page.has_more(self.source.page_size());

        for item in page.items {
          if self.seen.insert(item.record_key()) {
            self.results.push(item);
          }
        }

        self.state = if self.results.is_empty() {
          SessionState::Empty
        } else {
          SessionState::Ready
        };
        debug!(
          source = self.source.name(),
          received,
          total = self.results.len(),
          has_more = self.has_more,
          "page applied"
        );
      }
      FetchOutcome::Blocked(message) => {
        self.has_more = false;
        self.state = SessionState::Blocked(message);
      }
      FetchOutcome::Failed(message) => {
        self.toast = Some(Toast::failure("Search failed", message.clone()));
        self.state = SessionState::Failed(message);
      }
      FetchOutcome::Cancelled => {}
    }
  }

  fn supersede(&mut self) {
    self.cancel.cancel();
    self.cancel = CancellationToken::new();
    self.generation += 1;
    self.results.clear();
    self.seen.clear();
    self.offset = 0;
    self.has_more = false;
  }

  fn start_fetch(&mut self) {
    let Some(query) = self.query.clone() else {
      return;
    };

    let source = Arc::clone(&self.source);
    let cache = self.cache.clone();
    let policy = self.policy;
    let cancel = self.cancel.clone();
    let generation = self.generation;
    let offset = self.offset;
    let sender = self.sender.clone();

    info!(source = source.name(), generation, offset, "search issued");
    self.state = SessionState::Fetching;

    tokio::spawn(async move {
      let retry_sender = sender.clone();
      let outcome = fetch_with_retry(
        source.as_ref(),
        &cache,
        policy,
        &query,
        offset,
        &cancel,
        move |attempt, delay| {
          // Receiver may have been dropped
          let _ = retry_sender.send(Message {
            generation,
            offset,
            event: Event::Retrying { attempt, delay },
          });
        },
      )
      .await;

      if cancel.is_cancelled() {
        return;
      }
      let _ = sender.send(Message {
        generation,
        offset,
        event: Event::Finished(outcome),
      });
    });
  }
}

impl<S: PageSource> Drop for SearchSession<S> {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}
