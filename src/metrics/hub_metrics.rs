//! Hub metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for hub operations.
///
/// Every measurement carries a `hub` attribute with the hub's name so several
/// hubs can share one meter.
///
/// # Examples
///
/// ```rust,no_run
/// use pubsub_hub::metrics::HubMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("pubsub-hub");
/// let metrics = HubMetrics::new(meter);
///
/// let timer = metrics.start_publish("orders");
/// // ... dispatch ...
/// metrics.record_publish_complete("orders", timer, 3, 0);
/// ```
#[derive(Clone)]
pub struct HubMetrics {
    publishes: Counter<u64>,
    deliveries: Counter<u64>,
    failures: Counter<u64>,
    publish_duration: Histogram<f64>,
    pruned: Counter<u64>,
    active_registrations: Gauge<i64>,
}

impl HubMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let publishes = meter
            .u64_counter("pubsub_hub.publish.count")
            .with_description("Number of publish calls")
            .build();

        let deliveries = meter
            .u64_counter("pubsub_hub.delivery.success")
            .with_description("Number of handler invocations that completed")
            .build();

        let failures = meter
            .u64_counter("pubsub_hub.delivery.failures")
            .with_description("Number of handler invocations that failed or panicked")
            .build();

        let publish_duration = meter
            .f64_histogram("pubsub_hub.publish.duration")
            .with_description("Time until every matched handler finished, in seconds")
            .with_unit("s")
            .build();

        let pruned = meter
            .u64_counter("pubsub_hub.registrations.pruned")
            .with_description("Registrations removed because their subscriber was dropped")
            .build();

        let active_registrations = meter
            .i64_gauge("pubsub_hub.registrations.active")
            .with_description("Number of stored registrations")
            .build();

        Self {
            publishes,
            deliveries,
            failures,
            publish_duration,
            pruned,
            active_registrations,
        }
    }

    /// Start timing a publish call.
    pub fn start_publish(&self, hub: &str) -> Instant {
        self.publishes.add(1, &[attribute(hub)]);
        Instant::now()
    }

    /// Record the outcome of a finished publish call.
    pub fn record_publish_complete(&self, hub: &str, start: Instant, delivered: u64, failed: u64) {
        let attrs = [attribute(hub)];
        self.publish_duration
            .record(start.elapsed().as_secs_f64(), &attrs);
        self.deliveries.add(delivered, &attrs);
        self.failures.add(failed, &attrs);
    }

    /// Record registrations removed by a prune pass.
    pub fn record_pruned(&self, hub: &str, count: usize) {
        if count > 0 {
            self.pruned.add(count as u64, &[attribute(hub)]);
        }
    }

    /// Update the number of stored registrations.
    pub fn update_registration_count(&self, hub: &str, count: usize) {
        self.active_registrations
            .record(count as i64, &[attribute(hub)]);
    }
}

fn attribute(hub: &str) -> KeyValue {
    KeyValue::new("hub", hub.to_string())
}
