//! Readiness gate: wait until the first successful load, then never wait again.
//!
//! A mutex-protected `ready` flag plus two broadcast channels, one for OS
//! threads (`Condvar`) and one for async tasks (`Notify`). Opening is one-way
//! and idempotent; there is no re-arm.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: Mutex<bool>,
    threads: Condvar,
    tasks: Notify,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate and wake every waiter.
    ///
    /// Returns `true` only for the call that actually opened it. Later calls
    /// are no-ops.
    pub fn open(&self) -> bool {
        let mut ready = self.ready.lock();
        if *ready {
            return false;
        }
        *ready = true;
        // Broadcast while holding the flag lock so no waiter can slip
        // between its flag check and its registration.
        self.threads.notify_all();
        self.tasks.notify_waiters();
        true
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.lock()
    }

    /// Suspend the calling task until the gate is open.
    pub async fn wait(&self) {
        loop {
            let notified = self.tasks.notified();
            tokio::pin!(notified);
            // Register before checking the flag, otherwise an `open()` in
            // between would be missed.
            notified.as_mut().enable();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }

    /// Like [`wait`](Self::wait), bounded by `timeout`. Returns whether the gate is open.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }

    /// Block the calling thread until the gate is open.
    ///
    /// Must not be called from inside an async task.
    pub fn wait_blocking(&self) {
        let mut ready = self.ready.lock();
        while !*ready {
            self.threads.wait(&mut ready);
        }
    }
}
