//! Shutdown signalling for the accept loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A token that signals the host to stop accepting connections.
///
/// Cloning is cheap; every clone observes the same signal. Cancelling is
/// one-way and idempotent.
///
/// # Examples
///
/// ```
/// use ferrous_host::ShutdownToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let token = ShutdownToken::new();
/// let waiter = token.clone();
///
/// let task = tokio::spawn(async move { waiter.cancelled().await });
/// token.cancel();
/// task.await.unwrap();
/// assert!(token.is_cancelled());
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<ShutdownTokenInner>,
}

#[derive(Default)]
struct ShutdownTokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown and wakes every waiter.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Returns true if shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Completes once shutdown is requested, immediately if it already was.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for ShutdownToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
