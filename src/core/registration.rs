//! Registrations stored in the hub and the single-handler delivery boundary.

use crate::core::handler::{Callback, HandlerId};
use crate::error::HubError;
use crate::message::{Lineage, Message, TypeKey, argument_for, is_assignable};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

/// Liveness and identity of a subscriber, without owning it.
trait Tracked: Send + Sync {
    fn is_alive(&self) -> bool;
    fn address(&self) -> *const ();
}

impl<S: ?Sized + Send + Sync> Tracked for Weak<S> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }

    fn address(&self) -> *const () {
        self.as_ptr() as *const ()
    }
}

/// Non-owning reference to a subscriber.
///
/// Holding the `Weak` keeps the allocation (not the value) around, so the
/// address cannot be handed to another subscriber while this reference exists.
#[derive(Clone)]
pub(crate) struct SubscriberRef {
    target: Arc<dyn Tracked>,
    type_name: &'static str,
}

impl SubscriberRef {
    pub(crate) fn new<S>(subscriber: &Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            target: Arc::new(Arc::downgrade(subscriber)),
            type_name: std::any::type_name::<S>(),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.target.is_alive()
    }

    pub(crate) fn is<S: ?Sized>(&self, subscriber: &Arc<S>) -> bool {
        std::ptr::addr_eq(self.target.address(), Arc::as_ptr(subscriber))
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// One (subscriber, declared type, handler) entry. Never mutated after creation.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) subscriber: SubscriberRef,
    pub(crate) declared: TypeKey,
    pub(crate) handler: HandlerId,
    pub(crate) callback: Callback,
}

impl Registration {
    pub(crate) fn matches(&self, lineage: &Lineage) -> bool {
        is_assignable(self.declared, lineage)
    }

    /// Run the handler once for `value`.
    ///
    /// Errors and panics are captured here and never escape to sibling
    /// deliveries or the publisher.
    pub(crate) async fn deliver<M: Message>(self, value: Arc<M>) -> Result<(), HubError> {
        let payload = std::any::type_name::<M>();
        let subscriber = self.subscriber.type_name();
        let declared = self.declared;
        let callback = self.callback;

        let invocation = async move {
            let Some(argument) = argument_for(&value, declared) else {
                return Err(HubError::UpcastFailed {
                    payload,
                    subscriber,
                    declared: declared.name(),
                });
            };
            let outcome = match callback {
                Callback::Sync(f) => f(argument),
                Callback::Async(f) => f(argument).await,
            };
            outcome.map_err(|source| HubError::HandlerFailed {
                payload,
                subscriber,
                source,
            })
        };

        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(HubError::HandlerPanicked {
                payload,
                subscriber,
                message: panic_message(panic.as_ref()),
            }),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
