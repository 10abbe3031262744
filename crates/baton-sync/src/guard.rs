//! RAII guards for automatic lock release

use crate::{FairMutex, SyncResult};
use std::sync::Arc;

/// RAII guard for [`FairMutex`] (releases on drop)
///
/// The lock is released when the guard goes out of scope, including while
/// unwinding from a panic, so every exit path gives the lock back.
#[must_use = "guard will be immediately released if not held"]
pub struct FairMutexGuard<'a> {
    /// Reference to the mutex
    mutex: &'a FairMutex,
    /// Whether the guard has been manually unlocked
    unlocked: bool,
}

impl<'a> FairMutexGuard<'a> {
    /// The caller must already own `mutex`.
    pub(crate) fn new(mutex: &'a FairMutex) -> Self {
        Self {
            mutex,
            unlocked: false,
        }
    }

    /// Release the lock early (before drop)
    pub fn unlock(mut self) -> SyncResult<()> {
        self.unlocked = true;
        self.mutex.release()
    }
}

impl Drop for FairMutexGuard<'_> {
    fn drop(&mut self) {
        if !self.unlocked {
            // The guard owns the lock, so release cannot report NotHeld
            let _ = self.mutex.release();
        }
    }
}

/// RAII guard for `Arc<FairMutex>` (owned version)
///
/// Owns an `Arc` to the mutex so it can be moved across threads and
/// outlive the borrow it was created from.
#[must_use = "guard will be immediately released if not held"]
pub struct OwnedFairMutexGuard {
    /// Arc to the mutex
    mutex: Arc<FairMutex>,
    /// Whether the guard has been manually unlocked
    unlocked: bool,
}

impl OwnedFairMutexGuard {
    /// Release the lock early (before drop)
    pub fn unlock(mut self) -> SyncResult<()> {
        self.unlocked = true;
        self.mutex.release()
    }

    /// Get a reference to the mutex
    pub fn mutex(&self) -> &Arc<FairMutex> {
        &self.mutex
    }
}

impl Drop for OwnedFairMutexGuard {
    fn drop(&mut self) {
        if !self.unlocked {
            let _ = self.mutex.release();
        }
    }
}

impl FairMutex {
    /// Acquire the lock and wrap ownership in a borrowed guard
    pub fn lock(&self) -> FairMutexGuard<'_> {
        self.acquire();
        FairMutexGuard::new(self)
    }

    /// Acquire the lock only if it is free, returning a guard on success
    pub fn try_lock(&self) -> Option<FairMutexGuard<'_>> {
        self.try_acquire().then(|| FairMutexGuard::new(self))
    }

    /// Acquire the lock and wrap ownership in a guard holding an `Arc`
    pub fn lock_owned(self: &Arc<Self>) -> OwnedFairMutexGuard {
        self.acquire();
        OwnedFairMutexGuard {
            mutex: Arc::clone(self),
            unlocked: false,
        }
    }
}
