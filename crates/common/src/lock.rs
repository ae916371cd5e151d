//! Process-wide serialization of the messaging session.
//!
//! The automated client session (message sends, media sends) and the capture
//! pipeline cannot be driven by two operations at once. Every interaction
//! acquires [`SessionLock`] first; tokio's mutex is fair, so waiters are
//! granted ownership strictly in request order. There is no timeout and no
//! priority — first requested, first served.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Single-slot FIFO lock shared by the whole process.
///
/// Cloning yields another handle to the same lock. The returned guard
/// releases on drop, unconditionally, including on error paths.
#[derive(Clone, Default)]
pub struct SessionLock {
    inner: Arc<Mutex<()>>,
}

/// Ownership token for the session. Held for the duration of one outbound
/// action; dropping it hands the session to the next waiter.
pub type SessionGuard = OwnedMutexGuard<()>;

impl SessionLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait in line for the session.
    pub async fn acquire(&self) -> SessionGuard {
        Arc::clone(&self.inner).lock_owned().await
    }
}
