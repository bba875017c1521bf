//! Cooperative cancellation and bounded waits for remote calls.
//!
//! A remote call runs on a worker thread; the caller waits on an mpsc
//! channel and stops waiting when its token fires or its deadline passes.
//! The worker finishes in the background and its result is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::constants::CANCEL_POLL_MS;
use crate::{AppError, AppResult};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Shared cancellation flag. Clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        // Take the lock so a sleeper between its check and its wait is not missed.
        let _guard = self.inner.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> AppResult<()> {
        if self.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, returning `Cancelled` as soon as the token fires.
    pub fn sleep(&self, duration: Duration) -> AppResult<()> {
        let deadline = Instant::now() + duration;
        let mut guard = self.inner.lock.lock().unwrap_or_else(|p| p.into_inner());
        loop {
            if self.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let (g, _) = self
                .inner
                .wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|p| p.into_inner());
            guard = g;
        }
    }
}

/// Run `f` on a worker thread and wait for it, giving up with `Cancelled`
/// once `token` fires.
pub fn run_cancellable<T, F>(token: &CancelToken, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    token.check()?;
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        tx.send(f()).ok();
    });

    loop {
        match rx.recv_timeout(Duration::from_millis(CANCEL_POLL_MS)) {
            Ok(result) => return result,
            Err(RecvTimeoutError::Timeout) => token.check()?,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(AppError::Network("worker exited without a result".into()))
            }
        }
    }
}

/// Run `f` on a worker thread, failing with `Timeout(label)` after `limit`.
pub fn with_timeout<T, F>(limit: Duration, label: &str, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        tx.send(f()).ok();
    });

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(operation = label, timeout_ms = limit.as_millis() as u64, "Operation timed out");
            Err(AppError::Timeout(format!("{} after {}ms", label, limit.as_millis())))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(AppError::Network(format!("{}: worker exited without a result", label)))
        }
    }
}
