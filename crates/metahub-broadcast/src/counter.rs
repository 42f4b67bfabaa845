use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// A resettable event counter that tasks can wait on.
///
/// Every increment wakes all waiters, so `wait_for` observes new values
/// without polling.
#[derive(Debug, Default)]
pub struct SignalCounter {
    value: AtomicU64,
    changed: Notify,
}

impl SignalCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Add one and return the new value.
    pub fn increment(&self) -> u64 {
        let n = self.value.fetch_add(1, Ordering::SeqCst) + 1;
        self.changed.notify_waiters();
        n
    }

    /// Set the value back to zero, returning the value it had.
    pub fn reset(&self) -> u64 {
        let previous = self.value.swap(0, Ordering::SeqCst);
        self.changed.notify_waiters();
        previous
    }

    /// Wait until the value reaches `target` or `timeout` elapses.
    ///
    /// Returns `true` if the target was reached.
    pub async fn wait_for(&self, target: u64, timeout: Duration) -> bool {
        let reached = async {
            loop {
                let notified = self.changed.notified();
                tokio::pin!(notified);
                // Register before checking so an increment in between is not missed.
                notified.as_mut().enable();
                if self.get() >= target {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, reached).await.is_ok()
    }

    /// Wait for `target`, then reset. Returns the value observed at reset.
    pub async fn wait_and_reset(&self, target: u64, timeout: Duration) -> Option<u64> {
        if self.wait_for(target, timeout).await {
            Some(self.reset())
        } else {
            None
        }
    }
}
