//! The hub: registry, matching and fault-isolated fan-out.

use crate::core::HubBuilder;
use crate::core::handler::{Handler, HandlerOutcome};
use crate::core::registration::{Registration, SubscriberRef};
use crate::error::HubError;
use crate::message::{Lineage, Message, TypeKey};
use crate::settings::HubSettings;
use crate::sink::{FailureSink, delivery_context};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, trace};

#[cfg(feature = "metrics")]
use crate::metrics::HubMetrics;

/// In-process publish/subscribe hub.
///
/// Subscribers are any `Arc`-owned values. The hub only keeps a weak
/// reference to them: dropping the last `Arc` elsewhere is enough to stop
/// deliveries, and the stale registrations are removed the next time
/// [`publish`](Hub::publish) or an `unsubscribe*` call scans the registry.
///
/// Cloning a `Hub` is cheap and every clone shares the same registry.
///
/// # Examples
///
/// ```rust
/// use pubsub_hub::message;
/// use pubsub_hub::prelude::*;
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone)]
/// struct OrderPlaced {
///     id: u64,
/// }
///
/// message!(OrderPlaced);
///
/// struct Mailer;
///
/// # #[tokio::main]
/// # async fn main() {
/// let hub = Hub::new();
/// let mailer = Arc::new(Mailer);
///
/// hub.subscribe_fn(&mailer, |order: OrderPlaced| {
///     println!("sending receipt for order {}", order.id);
/// });
///
/// hub.publish(OrderPlaced { id: 7 }).await;
///
/// // No unsubscribe needed: dropping the subscriber ends its subscriptions.
/// drop(mailer);
/// hub.publish(OrderPlaced { id: 8 }).await;
/// assert_eq!(hub.registration_count(), 0);
/// # }
/// ```
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    settings: HubSettings,
    registrations: Mutex<Vec<Registration>>,
    sink: ArcSwap<Box<dyn FailureSink>>,
    #[cfg(feature = "metrics")]
    metrics: Option<HubMetrics>,
}

impl Hub {
    /// Create a hub with default settings that logs failures through `tracing`.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring a hub.
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    pub(crate) fn from_parts(
        settings: HubSettings,
        sink: Box<dyn FailureSink>,
        #[cfg(feature = "metrics")] metrics: Option<HubMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                settings,
                registrations: Mutex::new(Vec::new()),
                sink: ArcSwap::from_pointee(sink),
                #[cfg(feature = "metrics")]
                metrics,
            }),
        }
    }

    /// The hub's name, as recorded in logs and metrics.
    pub fn name(&self) -> &str {
        &self.inner.settings.name
    }

    /// The settings this hub was built with.
    pub fn settings(&self) -> &HubSettings {
        &self.inner.settings
    }

    /// Replace the failure sink. Publishes already in flight may still report
    /// to the previous sink.
    pub fn set_failure_sink<S: FailureSink + 'static>(&self, sink: S) {
        self.inner.sink.store(Arc::new(Box::new(sink)));
    }

    /// Register `handler` for values of declared type `D` on behalf of `subscriber`.
    ///
    /// Never fails and never deduplicates: subscribing the same handler twice
    /// delivers every matching value twice.
    ///
    /// Failure reports name the subscriber by `S`. For a trait object
    /// subscriber (`Arc<dyn Service>`) that is the trait object type, since
    /// the concrete type behind it is not known here. Subscribe through the
    /// concrete `Arc<T>` before coercing it if reports should name `T`.
    pub fn subscribe<S, D>(&self, subscriber: &Arc<S>, handler: Handler<D>)
    where
        S: ?Sized + Send + Sync + 'static,
        D: Send + 'static,
    {
        let registration = Registration {
            subscriber: SubscriberRef::new(subscriber),
            declared: TypeKey::of::<D>(),
            handler: handler.id(),
            callback: handler.erase(),
        };

        let count = {
            let mut registrations = self.inner.registrations.lock();
            registrations.push(registration);
            registrations.len()
        };

        trace!(
            hub = %self.name(),
            subscriber = std::any::type_name::<S>(),
            declared = std::any::type_name::<D>(),
            registrations = count,
            "Subscribed"
        );
        self.record_registration_count(count);
    }

    /// Register a fire-and-forget closure. See [`Handler::sync`].
    pub fn subscribe_fn<S, D, F, R>(&self, subscriber: &Arc<S>, handler: F) -> Handler<D>
    where
        S: ?Sized + Send + Sync + 'static,
        D: Send + 'static,
        F: Fn(D) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        let handler = Handler::sync(handler);
        self.subscribe(subscriber, handler.clone());
        handler
    }

    /// Register an asynchronous closure. See [`Handler::future`].
    pub fn subscribe_async<S, D, F, Fut>(&self, subscriber: &Arc<S>, handler: F) -> Handler<D>
    where
        S: ?Sized + Send + Sync + 'static,
        D: Send + 'static,
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutcome,
    {
        let handler = Handler::future(handler);
        self.subscribe(subscriber, handler.clone());
        handler
    }

    /// Remove every registration owned by `subscriber`, across all declared
    /// types. Registrations of dropped subscribers are removed as well.
    ///
    /// Unsubscribing an unknown subscriber is a no-op.
    pub fn unsubscribe<S>(&self, subscriber: &Arc<S>)
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let removed = self.retain(|r| r.subscriber.is_alive() && !r.subscriber.is(subscriber));
        debug!(
            hub = %self.name(),
            subscriber = std::any::type_name::<S>(),
            removed,
            "Unsubscribed"
        );
    }

    /// Remove the registrations `subscriber` made for declared type `D`.
    /// Registrations of dropped subscribers are removed as well.
    pub fn unsubscribe_type<D, S>(&self, subscriber: &Arc<S>)
    where
        D: 'static,
        S: ?Sized + Send + Sync + 'static,
    {
        let declared = TypeKey::of::<D>();
        let removed = self.retain(|r| {
            r.subscriber.is_alive() && !(r.subscriber.is(subscriber) && r.declared == declared)
        });
        debug!(
            hub = %self.name(),
            subscriber = std::any::type_name::<S>(),
            declared = declared.name(),
            removed,
            "Unsubscribed type"
        );
    }

    /// Remove the registrations `subscriber` made with `handler` (or any clone
    /// of it). Registrations of dropped subscribers are removed as well.
    pub fn unsubscribe_handler<D, S>(&self, subscriber: &Arc<S>, handler: &Handler<D>)
    where
        D: Send + 'static,
        S: ?Sized + Send + Sync + 'static,
    {
        let declared = TypeKey::of::<D>();
        let id = handler.id();
        let removed = self.retain(|r| {
            r.subscriber.is_alive()
                && !(r.subscriber.is(subscriber) && r.declared == declared && r.handler == id)
        });
        debug!(
            hub = %self.name(),
            subscriber = std::any::type_name::<S>(),
            declared = declared.name(),
            removed,
            "Unsubscribed handler"
        );
    }

    /// Remove every registration whose subscriber has been dropped.
    ///
    /// Returns the number of registrations removed. Called automatically at
    /// the start of every publish.
    pub fn prune(&self) -> usize {
        let removed = self.retain(|r| r.subscriber.is_alive());
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_pruned(self.name(), removed);
        }
        removed
    }

    /// Number of stored registrations, including any whose subscriber was
    /// dropped but which have not been pruned yet.
    pub fn registration_count(&self) -> usize {
        self.inner.registrations.lock().len()
    }

    /// Publish `value` to every live subscription whose declared type is
    /// `M` or one of its supertypes.
    ///
    /// Each matched handler runs on its own tokio task; this call returns once
    /// all of them have finished. Handler errors and panics are reported to
    /// the failure sink and never reach the caller.
    ///
    /// Dropping the returned future early (a timeout, a losing `select!`
    /// branch) stops the wait, not the deliveries: handlers already spawned
    /// keep running and still report their failures.
    pub async fn publish<M: Message>(&self, value: M) {
        let lineage = Lineage::of::<M>();
        let payload = lineage.concrete().name();

        #[cfg(feature = "metrics")]
        let timer = self
            .inner
            .metrics
            .as_ref()
            .map(|metrics| metrics.start_publish(self.name()));

        let matched = self.matching_handlers(&lineage);
        if matched.is_empty() {
            trace!(hub = %self.name(), payload, "No subscribers for message");
        } else if self.inner.settings.trace_dispatch {
            debug!(hub = %self.name(), payload, handlers = matched.len(), "Dispatching message");
        }

        let value = Arc::new(value);
        let mut deliveries = Deliveries(JoinSet::new());
        for registration in matched {
            let hub = self.clone();
            let value = Arc::clone(&value);
            deliveries.0.spawn(async move {
                match registration.deliver(value).await {
                    Ok(()) => true,
                    Err(err) => {
                        hub.report(&err);
                        false
                    }
                }
            });
        }

        let mut delivered = 0u64;
        let mut failed = 0u64;
        while let Some(joined) = deliveries.0.join_next().await {
            match joined {
                Ok(true) => delivered += 1,
                Ok(false) => failed += 1,
                Err(join_err) => {
                    failed += 1;
                    debug!(hub = %self.name(), payload, error = %join_err, "Delivery task did not complete");
                }
            }
        }

        if self.inner.settings.trace_dispatch && delivered + failed > 0 {
            debug!(hub = %self.name(), payload, delivered, failed, "Dispatch complete");
        }

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.inner.metrics, timer) {
            metrics.record_publish_complete(self.name(), timer, delivered, failed);
        }
    }

    /// Publish `M::default()`.
    pub async fn publish_default<M: Message + Default>(&self) {
        self.publish(M::default()).await;
    }

    /// Snapshot of the live registrations matching `lineage`. Prunes first.
    pub(crate) fn matching_handlers(&self, lineage: &Lineage) -> Vec<Registration> {
        self.prune();
        let registrations = self.inner.registrations.lock();
        registrations
            .iter()
            .filter(|r| r.matches(lineage))
            .cloned()
            .collect()
    }

    fn report(&self, err: &HubError) {
        let sink = self.inner.sink.load();
        sink.report(err, &delivery_context(err));
    }

    /// Keep registrations for which `keep` is true; returns how many were removed.
    fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&Registration) -> bool,
    {
        let (removed, count) = {
            let mut registrations = self.inner.registrations.lock();
            let before = registrations.len();
            registrations.retain(|r| keep(r));
            (before - registrations.len(), registrations.len())
        };
        if removed > 0 {
            self.record_registration_count(count);
        }
        removed
    }

    fn record_registration_count(&self, count: usize) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.inner.metrics {
            metrics.update_registration_count(self.name(), count);
        }
        #[cfg(not(feature = "metrics"))]
        let _ = count;
    }
}

/// Deliveries of one publish call.
///
/// Dropping an unfinished publish detaches its deliveries instead of aborting
/// them: every matched handler still runs to completion and reports its own
/// failure.
struct Deliveries(JoinSet<bool>);

impl Drop for Deliveries {
    fn drop(&mut self) {
        self.0.detach_all();
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("name", &self.name())
            .field("registrations", &self.registration_count())
            .finish_non_exhaustive()
    }
}
