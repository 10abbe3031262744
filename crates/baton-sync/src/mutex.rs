//! Fair FIFO mutex with direct ownership hand-off

use crate::{LockId, SyncError, SyncResult};
use parking_lot::{Condvar, Mutex as ParkingLotMutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Mutual-exclusion lock that grants ownership strictly in arrival order
///
/// A blocked `acquire` parks the calling thread. On `release`, ownership is
/// handed directly to the oldest waiter: the lock never appears free while
/// somebody is queued, so a newly arriving thread cannot jump the queue.
///
/// The lock is not re-entrant and carries no owner identity. Acquiring it
/// twice from the same thread deadlocks.
pub struct FairMutex {
    /// Unique lock ID
    id: LockId,

    /// `held` flag and FIFO wait queue, always updated together
    state: ParkingLotMutex<LockState>,
}

struct LockState {
    held: bool,
    waiters: VecDeque<Arc<Waiter>>,
}

/// One-shot resume token for a parked acquirer
struct Waiter {
    granted: ParkingLotMutex<bool>,
    condvar: Condvar,
}

impl Waiter {
    fn new() -> Self {
        Self {
            granted: ParkingLotMutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn grant(&self) {
        let mut granted = self.granted.lock();
        *granted = true;
        self.condvar.notify_one();
    }

    fn park(&self) {
        let mut granted = self.granted.lock();
        while !*granted {
            self.condvar.wait(&mut granted);
        }
    }
}

impl FairMutex {
    /// Create a new unlocked mutex
    pub fn new() -> Self {
        Self {
            id: LockId::new(),
            state: ParkingLotMutex::new(LockState {
                held: false,
                waiters: VecDeque::with_capacity(4),
            }),
        }
    }

    /// Get the lock ID
    pub fn id(&self) -> LockId {
        self.id
    }

    /// Acquire the lock, parking the current thread until it is granted
    ///
    /// Returns immediately if the lock is free. Otherwise the caller joins
    /// the back of the wait queue and owns the lock once it returns.
    pub fn acquire(&self) {
        let waiter = {
            let mut state = self.state.lock();
            if !state.held {
                state.held = true;
                return;
            }

            let waiter = Arc::new(Waiter::new());
            state.waiters.push_back(waiter.clone());
            trace!(lock = %self.id, position = state.waiters.len(), "queued behind holder");
            waiter
        };

        waiter.park();
    }

    /// Acquire the lock only if it is free
    ///
    /// A free lock never has queued waiters, so this never overtakes one.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.held {
            return false;
        }
        state.held = true;
        true
    }

    /// Release the lock, handing it to the oldest waiter if there is one
    ///
    /// Returns [`SyncError::NotHeld`] if the lock is free and nobody waits.
    pub fn release(&self) -> SyncResult<()> {
        let next = {
            let mut state = self.state.lock();
            if !state.held && state.waiters.is_empty() {
                return Err(SyncError::NotHeld(self.id));
            }

            match state.waiters.pop_front() {
                // `held` stays set: ownership moves without a free window
                Some(next) => {
                    trace!(lock = %self.id, remaining = state.waiters.len(), "handing off");
                    Some(next)
                }
                None => {
                    state.held = false;
                    None
                }
            }
        };

        if let Some(next) = next {
            next.grant();
        }
        Ok(())
    }

    /// Check if the lock is currently held
    pub fn is_locked(&self) -> bool {
        self.state.lock().held
    }

    /// Get the number of threads parked waiting for the lock
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

impl Default for FairMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FairMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FairMutex")
            .field("id", &self.id)
            .field("held", &state.held)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn wait_for_waiters(mutex: &FairMutex, count: usize) {
        while mutex.waiter_count() < count {
            thread::yield_now();
        }
    }

    #[test]
    fn test_mutex_creation() {
        let mutex = FairMutex::new();
        assert!(!mutex.is_locked());
        assert_eq!(mutex.waiter_count(), 0);
    }

    #[test]
    fn test_mutex_uncontended_acquire_release() {
        let mutex = FairMutex::new();

        mutex.acquire();
        assert!(mutex.is_locked());

        mutex.release().unwrap();
        assert!(!mutex.is_locked());
    }

    #[test]
    fn test_release_without_acquire() {
        let mutex = FairMutex::new();
        let result = mutex.release();
        assert_eq!(result, Err(SyncError::NotHeld(mutex.id())));
    }

    #[test]
    fn test_double_release() {
        let mutex = FairMutex::new();
        mutex.acquire();
        mutex.release().unwrap();
        assert!(mutex.release().is_err());
    }

    #[test]
    fn test_try_acquire() {
        let mutex = FairMutex::new();

        assert!(mutex.try_acquire());
        assert!(!mutex.try_acquire());

        mutex.release().unwrap();
        assert!(mutex.try_acquire());
        mutex.release().unwrap();
    }

    #[test]
    fn test_release_hands_off_to_waiter() {
        let mutex = FairMutex::new();
        mutex.acquire();

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                mutex.acquire();
                mutex.release().unwrap();
            });

            wait_for_waiters(&mutex, 1);
            mutex.release().unwrap();

            // Ownership went straight to the waiter
            assert_eq!(mutex.waiter_count(), 0);
            waiter.join().unwrap();
        });

        assert!(!mutex.is_locked());
    }

    #[test]
    fn test_debug_output() {
        let mutex = FairMutex::new();
        let output = format!("{:?}", mutex);
        assert!(output.contains("held: false"));
        assert!(output.contains("waiters: 0"));
    }
}
