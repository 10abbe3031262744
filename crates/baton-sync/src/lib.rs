//! Baton synchronization primitives
//!
//! This crate provides a fair mutual-exclusion lock for in-process
//! coordination:
//! - [`FairMutex`]: FIFO waiter ordering with direct ownership hand-off
//! - [`FairMutexGuard`] / [`OwnedFairMutexGuard`]: RAII release
//! - [`FairLock`]: a `FairMutex` paired with the data it protects

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod guard;
mod lock;
mod lock_id;
mod mutex;

pub use guard::{FairMutexGuard, OwnedFairMutexGuard};
pub use lock::{FairLock, FairLockGuard};
pub use lock_id::LockId;
pub use mutex::FairMutex;

/// Errors that can occur when using a [`FairMutex`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Release called while the lock is free and nobody is waiting
    #[error("Lock {0} is not held")]
    NotHeld(LockId),
}

/// Result type for lock operations
pub type SyncResult<T> = Result<T, SyncError>;
