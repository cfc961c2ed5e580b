//! Per-request disconnect signal.
//!
//! The transport holds a [`DisconnectGuard`] for as long as it is waiting on
//! the handler chain. If the connection goes away first, hyper drops the
//! service future, the guard fires, and `Context::closed` resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    fired: AtomicBool,
    notify: Notify,
}

/// A one-shot, clonable "client went away" signal.
#[derive(Debug, Clone, Default)]
pub struct Disconnect {
    inner: Arc<Inner>,
}

impl Disconnect {
    /// Creates an unfired signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Idempotent.
    pub fn fire(&self) {
        if !self.inner.fired.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Returns true once fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Resolves once the signal has fired.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a concurrent fire is not missed.
            let notified = self.inner.notify.notified();
            if self.is_fired() {
                return;
            }
            notified.await;
        }
    }

    /// Returns a guard that fires the signal when dropped while armed.
    #[must_use]
    pub fn guard(&self) -> DisconnectGuard {
        DisconnectGuard {
            signal: self.clone(),
            armed: true,
        }
    }
}

/// Fires its [`Disconnect`] on drop unless disarmed first.
#[derive(Debug)]
pub struct DisconnectGuard {
    signal: Disconnect,
    armed: bool,
}

impl DisconnectGuard {
    /// Drops the guard without firing.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if self.armed {
            self.signal.fire();
        }
    }
}
