//! Integration tests for FairMutex ordering and hand-off

use baton_sync::{FairLock, FairMutex, SyncError};
use crossbeam::channel;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

/// Spin until `count` threads are parked on the mutex
fn wait_for_waiters(mutex: &FairMutex, count: usize) {
    while mutex.waiter_count() < count {
        thread::yield_now();
    }
}

#[test]
fn test_waiters_granted_in_arrival_order() {
    let mutex = Arc::new(FairMutex::new());
    let order = Arc::new(Mutex::new(Vec::new()));
    let waiters = 6;

    mutex.acquire();

    let mut handles = Vec::new();
    for index in 0..waiters {
        let mutex_clone = Arc::clone(&mutex);
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            mutex_clone.acquire();
            order.lock().push(index);
            mutex_clone.release().unwrap();
        }));
        // Enqueue strictly one at a time so arrival order is known
        wait_for_waiters(&mutex, index + 1);
    }

    mutex.release().unwrap();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*order.lock(), (0..waiters).collect::<Vec<_>>());
    assert!(!mutex.is_locked());
}

#[test]
fn test_each_release_grants_exactly_one_waiter() {
    let mutex = Arc::new(FairMutex::new());
    let (granted_tx, granted_rx) = channel::unbounded();
    let mut release_txs = Vec::new();
    let mut handles = Vec::new();

    mutex.acquire();

    for index in 0..3 {
        let (release_tx, release_rx) = channel::bounded::<()>(0);
        release_txs.push(release_tx);
        let mutex_clone = Arc::clone(&mutex);
        let granted_tx = granted_tx.clone();
        handles.push(thread::spawn(move || {
            mutex_clone.acquire();
            granted_tx.send(index).unwrap();
            release_rx.recv().unwrap();
            mutex_clone.release().unwrap();
        }));
        wait_for_waiters(&mutex, index + 1);
    }

    mutex.release().unwrap();
    assert_eq!(granted_rx.recv().unwrap(), 0);
    assert_eq!(mutex.waiter_count(), 2);

    release_txs[0].send(()).unwrap();
    assert_eq!(granted_rx.recv().unwrap(), 1);
    assert_eq!(mutex.waiter_count(), 1);

    release_txs[1].send(()).unwrap();
    assert_eq!(granted_rx.recv().unwrap(), 2);
    assert_eq!(mutex.waiter_count(), 0);

    release_txs[2].send(()).unwrap();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(!mutex.is_locked());
}

#[test]
fn test_handoff_never_exposes_free_lock() {
    let mutex = Arc::new(FairMutex::new());
    let (granted_tx, granted_rx) = channel::bounded::<()>(0);
    let (release_tx, release_rx) = channel::bounded::<()>(0);

    mutex.acquire();

    let mutex_clone = Arc::clone(&mutex);
    let waiter = thread::spawn(move || {
        mutex_clone.acquire();
        granted_tx.send(()).unwrap();
        release_rx.recv().unwrap();
        mutex_clone.release().unwrap();
    });

    wait_for_waiters(&mutex, 1);
    mutex.release().unwrap();

    // Between hand-off and the waiter's wake-up nobody else can get in
    assert!(mutex.is_locked());
    assert!(!mutex.try_acquire());

    granted_rx.recv().unwrap();
    assert!(mutex.is_locked());
    assert!(!mutex.try_acquire());

    release_tx.send(()).unwrap();
    waiter.join().unwrap();

    assert!(!mutex.is_locked());
    assert!(mutex.try_acquire());
    mutex.release().unwrap();
}

#[test]
fn test_late_arrival_queues_behind_existing_waiters() {
    let mutex = Arc::new(FairMutex::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    mutex.acquire();

    let first = {
        let mutex = Arc::clone(&mutex);
        let order = Arc::clone(&order);
        thread::spawn(move || {
            mutex.acquire();
            order.lock().push("first");
            mutex.release().unwrap();
        })
    };
    wait_for_waiters(&mutex, 1);

    let second = {
        let mutex = Arc::clone(&mutex);
        let order = Arc::clone(&order);
        thread::spawn(move || {
            mutex.acquire();
            order.lock().push("second");
            mutex.release().unwrap();
        })
    };
    wait_for_waiters(&mutex, 2);

    mutex.release().unwrap();
    first.join().unwrap();
    second.join().unwrap();

    assert_eq!(*order.lock(), vec!["first", "second"]);
}

#[test]
fn test_release_on_fresh_lock_fails() {
    let mutex = FairMutex::new();
    assert_eq!(mutex.release(), Err(SyncError::NotHeld(mutex.id())));
    assert!(!mutex.is_locked());
}

#[test]
fn test_not_held_error_message() {
    let mutex = FairMutex::new();
    let err = mutex.release().unwrap_err();
    assert_eq!(err.to_string(), format!("Lock {} is not held", mutex.id()));
}

#[test]
fn test_fair_lock_under_contention() {
    let lock = Arc::new(FairLock::new(Vec::new()));

    crossbeam::scope(|s| {
        for worker in 0..4 {
            let lock = Arc::clone(&lock);
            s.spawn(move |_| {
                for step in 0..100 {
                    lock.lock().push((worker, step));
                }
            });
        }
    })
    .unwrap();

    let entries = lock.lock();
    assert_eq!(entries.len(), 400);
    for worker in 0..4 {
        let steps: Vec<_> = entries
            .iter()
            .filter(|(w, _)| *w == worker)
            .map(|(_, step)| *step)
            .collect();
        assert_eq!(steps, (0..100).collect::<Vec<_>>());
    }
}
