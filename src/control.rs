use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Cancellation handle for an in-progress poll loop.
///
/// The waits between poll attempts go through [`CancelToken::wait`], so
/// `cancel()` from another thread interrupts the sleep and the loop returns
/// [`Error::Cancelled`](crate::Error::Cancelled) at the next attempt
/// boundary. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake any thread sleeping in [`wait`](Self::wait).
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock().unwrap();
        *cancelled = true;
        self.inner.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock().unwrap()
    }

    /// Sleeps for up to `timeout`, returning early on cancellation.
    /// Returns `true` if the token was cancelled.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let mut cancelled = self.inner.cancelled.lock().unwrap();
        let deadline = std::time::Instant::now() + timeout;
        while !*cancelled {
            let now = std::time::Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .inner
                .cond
                .wait_timeout(cancelled, deadline - now)
                .unwrap();
            cancelled = guard;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_runs_to_timeout_when_not_cancelled() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn cancel_interrupts_wait() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let cancelled = waiter.wait(Duration::from_secs(60));
            (cancelled, start.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        let (cancelled, elapsed) = handle.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(60));
    }

    #[test]
    fn wait_returns_immediately_when_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.wait(Duration::from_secs(60)));
        assert!(token.is_cancelled());
    }
}
