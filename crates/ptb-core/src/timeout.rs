//! Single-shot, cancellable delayed action.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

/// Fires `on_expire` once after a delay unless cancelled first.
///
/// Cancelling is idempotent and safe after the timer has already fired. Dropping the
/// guard cancels it, so a guard stored next to the state it protects dies with it.
#[derive(Debug)]
pub struct TimeoutGuard {
    cancel: CancellationToken,
}

impl TimeoutGuard {
    /// Arm a timer on the current tokio runtime.
    pub fn arm<F, Fut>(after: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
              _ = token.cancelled() => {}
              _ = tokio::time::sleep(after) => on_expire().await,
            }
        });
        Self { cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
