//! Built-in metrics for hub operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Publish calls and their fan-out duration
//! - Successful and failed handler deliveries
//! - Pruned registrations
//! - Active registrations
//!
//! # Examples
//!
//! ```rust,no_run
//! use pubsub_hub::prelude::*;
//! use opentelemetry::global;
//!
//! let meter = global::meter("my-app");
//!
//! let hub = Hub::builder()
//!     .with_name("orders")
//!     .with_metrics(meter)
//!     .build();
//! ```

mod hub_metrics;

pub use hub_metrics::HubMetrics;
