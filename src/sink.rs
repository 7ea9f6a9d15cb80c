//! Reporting of swallowed handler failures.

use crate::error::HubError;
use std::sync::Arc;

/// Receives handler failures that the hub caught and swallowed.
///
/// The hub calls [`report`](FailureSink::report) once per failed delivery,
/// from the publishing task, after the handler's task has finished.
/// Implementations must not block for long: the publish call waits on them.
///
/// # Examples
///
/// ```rust
/// use pubsub_hub::prelude::*;
///
/// struct Stderr;
///
/// impl FailureSink for Stderr {
///     fn report(&self, error: &HubError, context: &str) {
///         eprintln!("{context}: {error}");
///     }
/// }
///
/// let hub = Hub::builder().with_failure_sink(Stderr).build();
/// ```
pub trait FailureSink: Send + Sync {
    /// Record one failure together with a human readable context line.
    fn report(&self, error: &HubError, context: &str);
}

impl<T: FailureSink + ?Sized> FailureSink for Arc<T> {
    fn report(&self, error: &HubError, context: &str) {
        (**self).report(error, context);
    }
}

impl<T: FailureSink + ?Sized> FailureSink for Box<T> {
    fn report(&self, error: &HubError, context: &str) {
        (**self).report(error, context);
    }
}

/// Default sink: logs every failure at `ERROR` level through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, error: &HubError, context: &str) {
        tracing::error!(
            error = %error,
            payload = error.payload().unwrap_or("unknown"),
            subscriber = error.subscriber().unwrap_or("unknown"),
            "{context}"
        );
    }
}

/// Context line logged next to a dispatch failure.
pub(crate) fn delivery_context(error: &HubError) -> String {
    format!(
        "Could not deliver message of type {} to subscriber of type {}",
        error.payload().unwrap_or("unknown"),
        error.subscriber().unwrap_or("unknown"),
    )
}
