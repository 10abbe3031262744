//! Subscriber handles with stable identity
//!
//! Closures cannot be compared, so the router stores [`Handler`] handles
//! instead. Clones share one [`HandlerId`]; subscribing a clone of an
//! already-subscribed handle is a no-op, and the same clone unsubscribes it.

use crate::error::HandlerError;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a [`Handler`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

impl HandlerId {
    /// Generate a new unique HandlerId
    pub fn new() -> Self {
        HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

type HandlerFn<P> = dyn Fn(&P) -> anyhow::Result<()> + Send + Sync;

/// Cloneable message handler for payloads of type `P`
pub struct Handler<P> {
    id: HandlerId,
    func: Arc<HandlerFn<P>>,
}

impl<P> Handler<P> {
    /// Wrap an infallible callback
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        Self::fallible(move |payload| {
            func(payload);
            Ok(())
        })
    }

    /// Wrap a callback that may return an error
    pub fn fallible<F>(func: F) -> Self
    where
        F: Fn(&P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            id: HandlerId::new(),
            func: Arc::new(func),
        }
    }

    /// Get the handler ID
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke the callback, turning an error or a panic into [`HandlerError`]
    pub fn invoke(&self, payload: &P) -> Result<(), HandlerError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.func)(payload))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(HandlerError::Failed {
                handler: self.id,
                source: err.into(),
            }),
            Err(panic) => Err(HandlerError::Panicked {
                handler: self.id,
                message: panic_message(panic.as_ref()),
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<P> Clone for Handler<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Arc::clone(&self.func),
        }
    }
}

impl<P> PartialEq for Handler<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Eq for Handler<P> {}

impl<P> Hash for Handler<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<P> fmt::Debug for Handler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish()
    }
}
