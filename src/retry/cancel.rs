//! Cooperative cancellation for retrying operations

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Cloneable cancellation flag; every clone observes the same cancellation
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<SignalState>,
}

#[derive(Debug, Default)]
struct SignalState {
    notify: Notify,
    cancelled: AtomicBool,
}

impl CancellationSignal {
    /// Create a new, un-fired signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal and wake every waiter
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
        debug!("Cancellation signal fired");
    }

    /// Check without waiting
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the signal has fired
    pub async fn cancelled(&self) {
        // register before checking so a concurrent cancel() is not missed
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_waiter_pending_until_cancel() {
        let signal = CancellationSignal::new();
        let mut waiter = task::spawn(signal.cancelled());

        assert_pending!(waiter.poll());
        assert!(!signal.is_cancelled());

        signal.cancel();
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
    }

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let signal = CancellationSignal::new();
        let waiter = signal.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.cancel();

        assert!(handle.await.unwrap());
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_immediately() {
        let signal = CancellationSignal::new();
        signal.cancel();

        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .expect("cancelled() should resolve");
    }
}
