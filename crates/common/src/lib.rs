//! Shared clock helper and the session lock used across all portero crates.

pub mod lock;
pub mod time;

pub use {
    lock::{SessionGuard, SessionLock},
    time::now_ms,
};
