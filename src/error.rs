//! Error types for pubsub-hub.

/// Result type alias for pubsub-hub operations.
pub type Result<T> = std::result::Result<T, HubError>;

/// Boxed error returned by failing handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the hub.
///
/// Dispatch failures are never returned to a publisher. They are handed to the
/// hub's [`FailureSink`](crate::sink::FailureSink) and then dropped.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A handler returned an error.
    #[error("Handler for {payload} on subscriber {subscriber} failed: {source}")]
    HandlerFailed {
        /// Type name of the published value
        payload: &'static str,
        /// Concrete type name of the subscriber
        subscriber: &'static str,
        /// The error returned by the handler
        #[source]
        source: BoxError,
    },

    /// A handler panicked while running.
    #[error("Handler for {payload} on subscriber {subscriber} panicked: {message}")]
    HandlerPanicked {
        /// Type name of the published value
        payload: &'static str,
        /// Concrete type name of the subscriber
        subscriber: &'static str,
        /// Panic payload rendered as text
        message: String,
    },

    /// A published value claimed a supertype it could not convert into.
    #[error("Message {payload} could not be converted to declared type {declared} for subscriber {subscriber}")]
    UpcastFailed {
        /// Type name of the published value
        payload: &'static str,
        /// Concrete type name of the subscriber
        subscriber: &'static str,
        /// Type name the subscription was declared against
        declared: &'static str,
    },

    /// Failed to load hub settings.
    #[error("Failed to load hub settings: {0}")]
    Settings(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HubError {
    /// Type name of the published value involved in a dispatch failure.
    pub fn payload(&self) -> Option<&'static str> {
        match self {
            Self::HandlerFailed { payload, .. }
            | Self::HandlerPanicked { payload, .. }
            | Self::UpcastFailed { payload, .. } => Some(*payload),
            _ => None,
        }
    }

    /// Concrete subscriber type involved in a dispatch failure.
    pub fn subscriber(&self) -> Option<&'static str> {
        match self {
            Self::HandlerFailed { subscriber, .. }
            | Self::HandlerPanicked { subscriber, .. }
            | Self::UpcastFailed { subscriber, .. } => Some(*subscriber),
            _ => None,
        }
    }
}
