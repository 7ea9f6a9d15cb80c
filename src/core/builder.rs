//! Builder for constructing Hub instances.

use crate::core::Hub;
use crate::settings::HubSettings;
use crate::sink::{FailureSink, TracingSink};

#[cfg(feature = "metrics")]
use crate::metrics::HubMetrics;

/// Builder for constructing a [`Hub`].
///
/// # Examples
///
/// ```rust
/// use pubsub_hub::prelude::*;
///
/// let hub = Hub::builder()
///     .with_name("orders")
///     .with_failure_sink(TracingSink)
///     .build();
///
/// assert_eq!(hub.name(), "orders");
/// ```
pub struct HubBuilder {
    settings: HubSettings,
    name: Option<String>,
    sink: Option<Box<dyn FailureSink>>,
    #[cfg(feature = "metrics")]
    metrics: Option<HubMetrics>,
}

impl HubBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: HubSettings::default(),
            name: None,
            sink: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Start from previously loaded settings.
    ///
    /// A name given with [`with_name`](Self::with_name) still takes precedence.
    pub fn with_settings(mut self, settings: HubSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Name used in log events and metric attributes.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Where swallowed handler failures are reported. Defaults to [`TracingSink`].
    pub fn with_failure_sink<S: FailureSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Record OpenTelemetry metrics for this hub.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(HubMetrics::new(meter));
        self
    }

    /// Build the hub.
    pub fn build(self) -> Hub {
        let mut settings = self.settings;
        if let Some(name) = self.name {
            settings.name = name;
        }
        let sink = self.sink.unwrap_or_else(|| Box::new(TracingSink));

        #[cfg(feature = "metrics")]
        return Hub::from_parts(settings, sink, self.metrics);

        #[cfg(not(feature = "metrics"))]
        Hub::from_parts(settings, sink)
    }
}

impl Default for HubBuilder {
    fn default() -> Self {
        Self::new()
    }
}
