//! Caller-triggered cancellation.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Shared abort flag for one or more in-flight sends.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

/// How `CancellationToken::wait_for` ended.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome<R> {
    Ready(R),
    Cancelled,
    /// Every sender hung up without producing a value.
    Abandoned,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every thread sleeping in `wait_timeout`.
    pub fn cancel(&self) {
        let mut cancelled = self.lock();
        *cancelled = true;
        self.inner.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Wake waiters without cancelling, so `wait_for` re-checks its channel.
    /// Producers call this after every send and when they hang up.
    pub(crate) fn notify(&self) {
        let _cancelled = self.lock();
        self.inner.signal.notify_all();
    }

    /// Block until `results` yields a value, its senders hang up, or the
    /// token is cancelled. A value that is already waiting wins over a
    /// cancellation.
    pub(crate) fn wait_for<R>(&self, results: &Receiver<R>) -> Outcome<R> {
        let mut cancelled = self.lock();
        loop {
            // The lock is held between this check and the wait, so a
            // `notify` after a send cannot slip in unseen.
            match results.try_recv() {
                Ok(value) => return Outcome::Ready(value),
                Err(TryRecvError::Disconnected) => return Outcome::Abandoned,
                Err(TryRecvError::Empty) => {}
            }
            if *cancelled {
                return Outcome::Cancelled;
            }
            cancelled = self
                .inner
                .signal
                .wait(cancelled)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `timeout` or until cancelled. Returns true if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut cancelled = self.lock();
        while !*cancelled {
            // Spurious wakeups loop back and re-check the deadline.
            cancelled = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    self.inner
                        .signal
                        .wait_timeout(cancelled, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .inner
                    .signal
                    .wait(cancelled)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
        *cancelled
    }
}
