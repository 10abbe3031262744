//! Router and queue configuration

/// Log level used when a subscriber fails during `send`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureLevel {
    /// `tracing::debug!`
    Debug,
    /// `tracing::warn!`
    #[default]
    Warn,
    /// `tracing::error!`
    Error,
}

/// Configuration for a [`NotificationRouter`](crate::NotificationRouter)
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Name attached to log events (default: "router")
    pub label: Option<String>,
    /// Number of topics to reserve space for up front (default: 16)
    pub topic_capacity: usize,
    /// Level at which handler failures are logged
    pub failure_level: FailureLevel,
}

impl RouterConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the initial topic capacity
    pub fn with_topic_capacity(mut self, capacity: usize) -> Self {
        self.topic_capacity = capacity;
        self
    }

    /// Set the level for handler failure logs
    pub fn with_failure_level(mut self, level: FailureLevel) -> Self {
        self.failure_level = level;
        self
    }

    /// Label used in log events
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("router")
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            label: None,
            topic_capacity: 16,
            failure_level: FailureLevel::default(),
        }
    }
}

/// Configuration for a [`DeferredEventQueue`](crate::DeferredEventQueue)
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Name attached to log events (default: "queue")
    pub label: Option<String>,
    /// Number of pending events to reserve space for (default: 8)
    pub initial_capacity: usize,
}

impl QueueConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the initial queue capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Label used in log events
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("queue")
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            label: None,
            initial_capacity: 8,
        }
    }
}
