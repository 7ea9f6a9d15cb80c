//! Handler shapes accepted by the hub.

use crate::error::BoxError;
use crate::message::Upcast;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Result of a single handler invocation.
pub type HandlerResult = std::result::Result<(), BoxError>;

type SyncFn<D> = Arc<dyn Fn(D) -> HandlerResult + Send + Sync>;
type AsyncFn<D> = Arc<dyn Fn(D) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Return types a handler may produce.
///
/// Handlers either return nothing or a `Result<(), E>`; an `Err` is reported
/// to the hub's failure sink like a panic would be.
pub trait HandlerOutcome {
    /// Normalize into a [`HandlerResult`].
    fn into_result(self) -> HandlerResult;
}

impl HandlerOutcome for () {
    fn into_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> HandlerOutcome for std::result::Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

/// Identity of a [`Handler`], shared by all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HandlerId(usize);

/// A callback for values of declared type `D`.
///
/// Cloning a handler keeps its identity, so the same handler can be
/// subscribed several times and later removed with
/// [`Hub::unsubscribe_handler`](crate::Hub::unsubscribe_handler).
///
/// # Examples
///
/// ```rust
/// use pubsub_hub::prelude::*;
///
/// let on_tick: Handler<u64> = Handler::sync(|tick: u64| println!("tick {tick}"));
/// let on_flush: Handler<u64> = Handler::future(|tick: u64| async move {
///     if tick == 0 {
///         return Err("nothing to flush");
///     }
///     Ok(())
/// });
///
/// assert!(!on_tick.is_async());
/// assert!(on_flush.is_async());
/// ```
pub struct Handler<D> {
    callback: TypedCallback<D>,
}

enum TypedCallback<D> {
    Sync(SyncFn<D>),
    Async(AsyncFn<D>),
}

impl<D: Send + 'static> Handler<D> {
    /// Fire-and-forget handler, run to completion on its own task.
    pub fn sync<F, R>(handler: F) -> Self
    where
        F: Fn(D) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        Self {
            callback: TypedCallback::Sync(Arc::new(move |value: D| handler(value).into_result())),
        }
    }

    /// Asynchronous handler, awaited on its own task.
    pub fn future<F, Fut>(handler: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutcome,
    {
        Self {
            callback: TypedCallback::Async(Arc::new(move |value: D| {
                handler(value).map(HandlerOutcome::into_result).boxed()
            })),
        }
    }

    /// Whether this handler is awaited.
    pub fn is_async(&self) -> bool {
        matches!(self.callback, TypedCallback::Async(_))
    }

    pub(crate) fn id(&self) -> HandlerId {
        let ptr = match &self.callback {
            TypedCallback::Sync(f) => Arc::as_ptr(f) as *const (),
            TypedCallback::Async(f) => Arc::as_ptr(f) as *const (),
        };
        HandlerId(ptr as usize)
    }

    /// Erase the declared type so the registration can live in the shared list.
    pub(crate) fn erase(&self) -> Callback {
        match &self.callback {
            TypedCallback::Sync(f) => {
                let f = Arc::clone(f);
                Callback::Sync(Arc::new(move |argument: Upcast| f(downcast::<D>(argument)?)))
            }
            TypedCallback::Async(f) => {
                let f = Arc::clone(f);
                Callback::Async(Arc::new(move |argument: Upcast| match downcast::<D>(argument) {
                    Ok(value) => f(value),
                    Err(err) => futures::future::ready(Err(err)).boxed(),
                }))
            }
        }
    }
}

impl<D> Clone for Handler<D> {
    fn clone(&self) -> Self {
        let callback = match &self.callback {
            TypedCallback::Sync(f) => TypedCallback::Sync(Arc::clone(f)),
            TypedCallback::Async(f) => TypedCallback::Async(Arc::clone(f)),
        };
        Self { callback }
    }
}

impl<D> std::fmt::Debug for Handler<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.callback {
            TypedCallback::Sync(_) => "sync",
            TypedCallback::Async(_) => "async",
        };
        f.debug_struct("Handler")
            .field("declared", &std::any::type_name::<D>())
            .field("kind", &kind)
            .finish()
    }
}

fn downcast<D: 'static>(argument: Upcast) -> std::result::Result<D, BoxError> {
    argument
        .downcast::<D>()
        .map(|value| *value)
        .map_err(|_| format!("argument is not a {}", std::any::type_name::<D>()).into())
}

/// Type-erased handler stored in a registration. Dispatch selects on the tag.
#[derive(Clone)]
pub(crate) enum Callback {
    Sync(Arc<dyn Fn(Upcast) -> HandlerResult + Send + Sync>),
    Async(Arc<dyn Fn(Upcast) -> BoxFuture<'static, HandlerResult> + Send + Sync>),
}
