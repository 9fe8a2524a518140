use std::future::Future;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use scour::transport::FetchError;

/// One background fetch owned by a detail view, cancelled when the view goes away.
pub struct Loader<T> {
  receiver: Option<oneshot::Receiver<Result<T, FetchError>>>,
  cancel: CancellationToken,
}

impl<T: Send + 'static> Loader<T> {
  pub fn spawn<F, Fut>(fetch: F) -> Self
  where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    let cancel = CancellationToken::new();
    let request = fetch(cancel.clone());

    tokio::spawn(async move {
      // Ignore send errors - view may have been closed
      let _ = tx.send(request.await);
    });

    Self {
      receiver: Some(rx),
      cancel,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.receiver.is_some()
  }

  /// The result, once, when the fetch has finished.
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    let receiver = self.receiver.as_mut()?;
    let outcome = match receiver.try_recv() {
      Ok(result) => result.map_err(|e| e.to_string()),
      Err(oneshot::error::TryRecvError::Empty) => return None,
      Err(oneshot::error::TryRecvError::Closed) => Err("request was dropped".to_string()),
    };
    self.receiver = None;
    Some(outcome)
  }
}

impl<T> Drop for Loader<T> {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}
