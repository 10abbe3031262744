//! Fair lock that owns the data it protects

use crate::{FairMutex, LockId};
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A [`FairMutex`] paired with the value it guards
///
/// Access goes through [`FairLockGuard`], so the FIFO and hand-off
/// guarantees of the underlying mutex apply to the data.
pub struct FairLock<T> {
    mutex: FairMutex,
    data: UnsafeCell<T>,
}

// Safety: the data is only reachable through a guard, and at most one guard
// exists at a time.
unsafe impl<T: Send> Send for FairLock<T> {}
unsafe impl<T: Send> Sync for FairLock<T> {}

impl<T> FairLock<T> {
    /// Create a new unlocked lock around `value`
    pub fn new(value: T) -> Self {
        Self {
            mutex: FairMutex::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Get the ID of the underlying mutex
    pub fn id(&self) -> LockId {
        self.mutex.id()
    }

    /// Acquire the lock, parking until it is granted
    pub fn lock(&self) -> FairLockGuard<'_, T> {
        self.mutex.acquire();
        FairLockGuard { lock: self }
    }

    /// Acquire the lock only if it is free
    pub fn try_lock(&self) -> Option<FairLockGuard<'_, T>> {
        self.mutex
            .try_acquire()
            .then(|| FairLockGuard { lock: self })
    }

    /// Check if the lock is currently held
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }

    /// Get the number of threads waiting for the lock
    pub fn waiter_count(&self) -> usize {
        self.mutex.waiter_count()
    }

    /// Mutable access without locking; the borrow proves exclusivity
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consume the lock, returning the protected value
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default> Default for FairLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for FairLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FairLock")
            .field("mutex", &self.mutex)
            .finish_non_exhaustive()
    }
}

/// RAII guard giving access to the data of a [`FairLock`]
#[must_use = "guard will be immediately released if not held"]
pub struct FairLockGuard<'a, T> {
    lock: &'a FairLock<T>,
}

// Safety: sharing the guard only shares `&T`.
unsafe impl<T: Sync> Sync for FairLockGuard<'_, T> {}

impl<T> Deref for FairLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: this guard is the unique owner of the lock
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for FairLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: this guard is the unique owner of the lock
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: fmt::Debug> fmt::Debug for FairLockGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FairLockGuard").field("data", &**self).finish()
    }
}

impl<T> Drop for FairLockGuard<'_, T> {
    fn drop(&mut self) {
        let _ = self.lock.mutex.release();
    }
}
