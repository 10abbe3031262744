//! Deferred event queue flushed under a fair lock
//!
//! Callbacks are queued with [`DeferredEventQueue::schedule_event`] and run
//! later, in FIFO order, by [`DeferredEventQueue::process_events`]. A drain
//! holds the queue's [`FairMutex`] for its whole duration and keeps popping
//! until the queue is empty, so anything a callback schedules on the draining
//! thread is absorbed into the same pass. Other threads that schedule or
//! clear while a drain runs wait for it to finish.
//!
//! Unlike [`NotificationRouter`](crate::NotificationRouter), a failing
//! callback is not isolated: a panic unwinds out of `process_events`,
//! releases the lock and leaves the remaining callbacks queued.

use crate::config::QueueConfig;
use crate::error::QueueError;
use baton_sync::FairMutex;
use crossbeam::atomic::AtomicCell;
use parking_lot::Mutex as ParkingLotMutex;
use std::collections::VecDeque;
use std::fmt;
use std::thread::{self, ThreadId};
use tracing::debug;

type PendingEvent<S, A> = Box<dyn FnOnce(&S, &A) + Send>;

/// FIFO queue of one-shot callbacks taking `(&sender, &args)`
pub struct DeferredEventQueue<S, A> {
    /// Queued callbacks; this mutex is never held while one runs
    pending: ParkingLotMutex<VecDeque<PendingEvent<S, A>>>,

    /// Serializes enqueue, drain and clear
    lock: FairMutex,

    /// Thread currently draining, if any
    drainer: AtomicCell<Option<ThreadId>>,

    config: QueueConfig,
}

/// Marks the current thread as the drainer until dropped
struct DrainScope<'a> {
    drainer: &'a AtomicCell<Option<ThreadId>>,
}

impl<'a> DrainScope<'a> {
    fn enter(drainer: &'a AtomicCell<Option<ThreadId>>) -> Self {
        drainer.store(Some(thread::current().id()));
        Self { drainer }
    }
}

impl Drop for DrainScope<'_> {
    fn drop(&mut self) {
        self.drainer.store(None);
    }
}

impl<S, A> DeferredEventQueue<S, A> {
    /// Create an empty queue with the default configuration
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create an empty queue
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            pending: ParkingLotMutex::new(VecDeque::with_capacity(config.initial_capacity)),
            lock: FairMutex::new(),
            drainer: AtomicCell::new(None),
            config,
        }
    }

    /// Get the queue configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Append `event` to the tail of the queue
    ///
    /// Called from a callback of a drain running on this thread, the event
    /// is appended directly and runs later in that same drain.
    pub fn schedule_event<F>(&self, event: F)
    where
        F: FnOnce(&S, &A) + Send + 'static,
    {
        let event: PendingEvent<S, A> = Box::new(event);

        if self.is_draining_thread() {
            // The drain on this thread already owns the lock
            self.pending.lock().push_back(event);
            return;
        }

        let _guard = self.lock.lock();
        self.pending.lock().push_back(event);
    }

    /// Run every queued callback with `(sender, args)` until the queue is empty
    ///
    /// Returns the number of callbacks run. Returns `Ok(0)` without touching
    /// the lock when nothing is queued, and [`QueueError::ReentrantDrain`]
    /// when called from inside one of this queue's callbacks.
    pub fn process_events(&self, sender: &S, args: &A) -> Result<usize, QueueError> {
        if self.is_draining_thread() {
            return Err(QueueError::ReentrantDrain);
        }
        if self.pending.lock().is_empty() {
            return Ok(0);
        }

        let _guard = self.lock.lock();
        let _scope = DrainScope::enter(&self.drainer);

        let mut processed = 0;
        loop {
            // Re-check on every pass: callbacks may have scheduled more
            let next = self.pending.lock().pop_front();
            let Some(event) = next else {
                break;
            };
            event(sender, args);
            processed += 1;
        }

        debug!(queue = self.config.label(), processed, "drained events");
        Ok(processed)
    }

    /// Discard every queued callback without running it
    ///
    /// Returns the number of callbacks dropped.
    pub fn clear_events(&self) -> usize {
        let discarded = if self.is_draining_thread() {
            std::mem::take(&mut *self.pending.lock())
        } else {
            let _guard = self.lock.lock();
            std::mem::take(&mut *self.pending.lock())
        };

        debug!(queue = self.config.label(), discarded = discarded.len(), "cleared events");
        discarded.len()
    }

    /// Number of callbacks waiting to run
    pub fn pending_event_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Check if a drain is in progress on any thread
    pub fn is_processing(&self) -> bool {
        self.drainer.load().is_some()
    }

    fn is_draining_thread(&self) -> bool {
        self.drainer.load() == Some(thread::current().id())
    }
}

impl<S, A> Default for DeferredEventQueue<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> fmt::Debug for DeferredEventQueue<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredEventQueue")
            .field("label", &self.config.label())
            .field("pending", &self.pending_event_count())
            .field("processing", &self.is_processing())
            .finish_non_exhaustive()
    }
}
