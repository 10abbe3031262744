//! Error types for the router and the deferred queue

use crate::handler::HandlerId;

/// Errors returned by [`NotificationRouter`](crate::NotificationRouter)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// Topic key was the empty string
    #[error("Topic cannot be empty")]
    EmptyTopic,
}

/// Errors returned by [`DeferredEventQueue`](crate::DeferredEventQueue)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// `process_events` was called from a callback of the drain in progress
    #[error("Cannot process events from inside a running drain")]
    ReentrantDrain,
}

/// Failure raised by a subscriber while a message was dispatched
///
/// `send` reports these through `tracing` and keeps delivering; they never
/// reach the publisher.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The handler returned an error
    #[error("Handler {handler} failed: {source}")]
    Failed {
        /// Handler that failed
        handler: HandlerId,
        /// Error it returned
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The handler panicked
    #[error("Handler {handler} panicked: {message}")]
    Panicked {
        /// Handler that panicked
        handler: HandlerId,
        /// Panic payload, if it was a string
        message: String,
    },
}

impl HandlerError {
    /// Get the ID of the handler that failed
    pub fn handler(&self) -> HandlerId {
        match self {
            Self::Failed { handler, .. } | Self::Panicked { handler, .. } => *handler,
        }
    }
}
