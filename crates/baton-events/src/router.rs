//! Topic-keyed publish/subscribe router
//!
//! The registry lives behind a [`FairLock`] that is held only while the
//! registry itself is read or changed. `send` copies the topic's subscriber
//! set into a dispatch snapshot, lets go of the lock, and only then calls the
//! handlers. Handlers are therefore free to subscribe, unsubscribe or send
//! from inside a callback, and the set that receives a message is fixed at
//! the moment `send` looked it up.

use crate::config::{FailureLevel, RouterConfig};
use crate::error::{HandlerError, RouterError};
use crate::handler::Handler;
use baton_sync::FairLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, trace, warn};

type Registry<P> = FxHashMap<String, FxHashSet<Handler<P>>>;

/// Outcome of a single [`NotificationRouter::send`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Handlers that ran to completion
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

impl Dispatch {
    /// Total number of handlers that were called
    pub fn invoked(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Router delivering payloads of type `P` to the handlers of a topic
pub struct NotificationRouter<P> {
    /// Topic key to subscriber set
    registry: FairLock<Registry<P>>,

    /// Sum of all subscriber set sizes, updated while the registry is locked
    subscribers: AtomicUsize,

    config: RouterConfig,
}

impl<P> NotificationRouter<P> {
    /// Create an empty router with the default configuration
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Create an empty router
    pub fn with_config(config: RouterConfig) -> Self {
        let registry =
            FxHashMap::with_capacity_and_hasher(config.topic_capacity, Default::default());
        Self {
            registry: FairLock::new(registry),
            subscribers: AtomicUsize::new(0),
            config,
        }
    }

    /// Get the router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Subscribe `handler` to `topic`
    ///
    /// Subscribing a handler that is already in the topic's set is a no-op.
    pub fn subscribe(&self, topic: &str, handler: &Handler<P>) -> Result<(), RouterError> {
        if topic.is_empty() {
            return Err(RouterError::EmptyTopic);
        }

        let mut registry = self.registry.lock();
        let added = registry
            .entry(topic.to_owned())
            .or_default()
            .insert(handler.clone());
        if added {
            self.subscribers.fetch_add(1, Ordering::AcqRel);
        }

        debug!(router = self.config.label(), topic, handler = %handler.id(), added, "subscribe");
        Ok(())
    }

    /// Deliver `payload` to every handler subscribed to `topic`
    ///
    /// Handlers run on the calling thread, outside the registry lock, in the
    /// set's iteration order. A handler that fails is logged and counted in
    /// [`Dispatch::failed`]; the rest still run.
    pub fn send(&self, topic: &str, payload: &P) -> Result<Dispatch, RouterError> {
        if topic.is_empty() {
            return Err(RouterError::EmptyTopic);
        }

        // Nobody listens anywhere
        if self.subscribers.load(Ordering::Acquire) == 0 {
            return Ok(Dispatch::default());
        }

        let snapshot: Vec<Handler<P>> = {
            let registry = self.registry.lock();
            match registry.get(topic) {
                Some(handlers) => handlers.iter().cloned().collect(),
                None => return Ok(Dispatch::default()),
            }
        };

        let mut dispatch = Dispatch::default();
        for handler in &snapshot {
            match handler.invoke(payload) {
                Ok(()) => dispatch.delivered += 1,
                Err(err) => {
                    self.report_failure(topic, &err);
                    dispatch.failed += 1;
                }
            }
        }

        trace!(
            router = self.config.label(),
            topic,
            delivered = dispatch.delivered,
            failed = dispatch.failed,
            "send"
        );
        Ok(dispatch)
    }

    /// Remove `handler` from `topic`; absent topics or handlers are ignored
    pub fn unsubscribe(&self, topic: &str, handler: &Handler<P>) {
        let mut registry = self.registry.lock();
        if let Some(handlers) = registry.get_mut(topic) {
            if handlers.remove(handler) {
                self.subscribers.fetch_sub(1, Ordering::AcqRel);
                debug!(router = self.config.label(), topic, handler = %handler.id(), "unsubscribe");
            }
        }
    }

    /// Drop every handler subscribed to `topic`
    ///
    /// The topic itself stays registered with an empty set.
    pub fn clear_subscribers(&self, topic: &str) {
        let mut registry = self.registry.lock();
        if let Some(handlers) = registry.get_mut(topic) {
            let removed = handlers.len();
            handlers.clear();
            self.subscribers.fetch_sub(removed, Ordering::AcqRel);
            debug!(router = self.config.label(), topic, removed, "clear subscribers");
        }
    }

    /// Total number of subscriptions across all topics
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Acquire)
    }

    /// Number of handlers subscribed to `topic`
    pub fn topic_subscriber_count(&self, topic: &str) -> usize {
        self.registry.lock().get(topic).map_or(0, |handlers| handlers.len())
    }

    /// Check if `topic` has ever been subscribed to
    pub fn has_topic(&self, topic: &str) -> bool {
        self.registry.lock().contains_key(topic)
    }

    fn report_failure(&self, topic: &str, err: &HandlerError) {
        let router = self.config.label();
        let handler = err.handler();
        match self.config.failure_level {
            FailureLevel::Debug => debug!(router, topic, %handler, error = %err, "handler failed"),
            FailureLevel::Warn => warn!(router, topic, %handler, error = %err, "handler failed"),
            FailureLevel::Error => error!(router, topic, %handler, error = %err, "handler failed"),
        }
    }
}

impl<P> Default for NotificationRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for NotificationRouter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRouter")
            .field("label", &self.config.label())
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}
