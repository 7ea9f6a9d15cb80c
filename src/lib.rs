//! # pubsub-hub
//!
//! In-process publish/subscribe with weak subscriber tracking, covariant type
//! matching and fault-isolated fan-out.
//!
//! ## Overview
//!
//! `pubsub-hub` provides a single coordinator, [`Hub`], that combines:
//! - A registry of (subscriber, declared type, handler) registrations that
//!   never keeps a subscriber alive
//! - Covariant matching: a subscription for a base type receives every
//!   published subtype, and [`Envelope`] subscriptions receive everything
//! - Concurrent dispatch, one tokio task per matched handler, where a failing
//!   or panicking handler never affects its siblings or the publisher
//!
//! ## Quick Start
//!
//! ```rust
//! use pubsub_hub::message;
//! use pubsub_hub::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone)]
//! struct Animal {
//!     name: String,
//! }
//!
//! #[derive(Debug, Clone)]
//! struct Dog {
//!     animal: Animal,
//!     good_boy: bool,
//! }
//!
//! message!(Animal);
//! message!(Dog: Animal => animal);
//!
//! struct Zoo;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let hub = Hub::new();
//! let zoo = Arc::new(Zoo);
//!
//! // Receives Animals and every subtype of Animal
//! hub.subscribe_fn(&zoo, |animal: Animal| println!("{} arrived", animal.name));
//!
//! // Asynchronous handlers are awaited on their own task
//! hub.subscribe_async(&zoo, |dog: Dog| async move {
//!     if !dog.good_boy {
//!         return Err("needs training");
//!     }
//!     Ok(())
//! });
//!
//! // Returns once both handlers are done; handler failures are only logged
//! hub.publish(Dog {
//!     animal: Animal { name: "Rex".to_string() },
//!     good_boy: false,
//! })
//! .await;
//! # }
//! ```
//!
//! ## Subscriber lifetime
//!
//! Subscribers are passed as `&Arc<S>` and the hub keeps only a
//! [`Weak`](std::sync::Weak) reference. Dropping the last `Arc` stops all
//! deliveries to that subscriber; its registrations are removed by the next
//! publish or unsubscribe call.
//!
//! ## Feature Flags
//!
//! - `settings` (default): load [`HubSettings`] from files and environment variables
//! - `metrics`: OpenTelemetry metrics via [`metrics::HubMetrics`]

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod message;
pub mod settings;
pub mod sink;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use crate::core::{Handler, HandlerOutcome, HandlerResult, Hub, HubBuilder};
pub use crate::error::{BoxError, HubError, Result};
pub use crate::message::{Envelope, Lineage, Message, TypeKey, Upcast, is_assignable};
pub use crate::settings::HubSettings;
pub use crate::sink::{FailureSink, TracingSink};

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{Handler, HandlerOutcome, Hub, HubBuilder};
    pub use crate::error::{BoxError, HubError, Result};
    pub use crate::message::{Envelope, Lineage, Message, TypeKey, Upcast, is_assignable};
    pub use crate::settings::HubSettings;
    pub use crate::sink::{FailureSink, TracingSink};
}
