use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Outstanding-operation counter backing the idle/busy indicator.
///
/// Busy means at least one file pipeline has been dispatched and has not settled yet. The count
/// is published on a `watch` channel so a UI can redraw on every change.
pub struct BusyTracker {
    outstanding: watch::Sender<usize>,
}

impl BusyTracker {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self { outstanding }
    }

    /// Register one outstanding operation. It settles when the returned guard is dropped.
    pub fn begin(self: &Arc<Self>) -> BusyGuard {
        self.outstanding.send_modify(|n| *n += 1);
        BusyGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of operations that have not settled.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding() > 0
    }

    /// Subscribe to changes of the outstanding count.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.outstanding.subscribe()
    }

    /// Wait until no operation is outstanding. Returns immediately when already idle.
    pub async fn wait_idle(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    fn settle(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Default for BusyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BusyTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusyTracker")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Settles one outstanding operation on drop, including during unwinding.
#[must_use = "dropping the guard immediately settles the operation"]
pub struct BusyGuard {
    tracker: Arc<BusyTracker>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.tracker.settle();
    }
}

impl fmt::Debug for BusyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusyGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_overlapping_operations() {
        let tracker = Arc::new(BusyTracker::new());
        assert!(!tracker.is_busy());

        let a = tracker.begin();
        let b = tracker.begin();
        assert_eq!(tracker.outstanding(), 2);

        // A fast file finishing first must not flip the indicator to idle.
        drop(a);
        assert!(tracker.is_busy());

        drop(b);
        assert!(!tracker.is_busy());
    }

    #[tokio::test]
    async fn wait_idle_returns_after_last_guard() {
        let tracker = Arc::new(BusyTracker::new());
        let guard = tracker.begin();
        let mut rx = tracker.subscribe();

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.wait_idle().await })
        };
        tokio::task::yield_now().await;
        drop(guard);

        waiter.await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 0);
    }

    #[test]
    fn guard_settles_on_panic() {
        let tracker = Arc::new(BusyTracker::new());
        let t = Arc::clone(&tracker);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = t.begin();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!tracker.is_busy());
    }
}
