//! Caller-side cancellation for in-progress calls.
//!
//! A cancelled token stops a call from starting another attempt and cuts
//! short the backoff pause. An attempt already on the wire still runs until
//! its own deadline.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every call using this token. Idempotent.
    pub fn cancel(&self) {
        *self.lock() = true;
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the token
    /// was (or became) cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut cancelled = self.lock();
        loop {
            if *cancelled {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            cancelled = match self.inner.wake.wait_timeout(cancelled, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_sleep_completes_when_not_cancelled() {
        let token = CancelToken::new();
        let started = Instant::now();
        assert!(token.sleep(Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_cancel_wakes_sleeper() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let started = Instant::now();
        let handle = thread::spawn(move || sleeper.sleep(Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        assert!(!handle.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_sleep_on_cancelled_token_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        assert!(!token.sleep(Duration::from_secs(10)));
    }
}
