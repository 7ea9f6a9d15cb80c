//! Message types and the covariant matching relation.
//!
//! Rust has no class inheritance, so a message type declares its supertypes
//! explicitly through [`Message`]. A subscription declared against type `D`
//! receives a published value of type `M` when [`is_assignable`] holds for
//! `(D, Lineage::of::<M>())`, and the hub converts the value into a `D` with
//! [`Message::upcast`] before handing it to the handler.
//!
//! [`Envelope`] is the root type: every message is assignable to it.
//!
//! # Examples
//!
//! ```rust
//! use pubsub_hub::message;
//! use pubsub_hub::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Animal {
//!     name: String,
//! }
//!
//! #[derive(Debug, Clone)]
//! struct Dog {
//!     animal: Animal,
//!     breed: String,
//! }
//!
//! message!(Animal);
//! message!(Dog: Animal => animal);
//!
//! let lineage = Lineage::of::<Dog>();
//! assert!(is_assignable(TypeKey::of::<Animal>(), &lineage));
//! assert!(is_assignable(TypeKey::of::<Envelope>(), &lineage));
//! assert!(!is_assignable(TypeKey::of::<Dog>(), &Lineage::of::<Animal>()));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Owned value produced by an upcast, ready to be handed to a handler.
pub type Upcast = Box<dyn Any + Send>;

/// Runtime identity of a type, with its name kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value that can be published through a [`Hub`](crate::Hub).
///
/// The default implementation declares no supertypes, which makes the type a
/// hierarchy root of its own: only subscriptions for the type itself (and for
/// [`Envelope`]) receive it. Use the [`message!`](crate::message!) macro for
/// the common case of a struct embedding its base type in a field.
///
/// # Implementing by hand
///
/// `supertypes` lists every transitive supertype and `upcast` must return a
/// value of exactly the requested type for each of them. Supertypes do not
/// have to be messages themselves, so a type can also be exposed as a trait
/// object:
///
/// ```rust
/// use pubsub_hub::prelude::*;
/// use std::sync::Arc;
///
/// trait Named: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// #[derive(Clone)]
/// struct Cat {
///     name: String,
/// }
///
/// impl Named for Cat {
///     fn name(&self) -> &str {
///         &self.name
///     }
/// }
///
/// impl Message for Cat {
///     fn supertypes() -> Vec<TypeKey> {
///         vec![TypeKey::of::<Arc<dyn Named>>()]
///     }
///
///     fn upcast(&self, target: TypeKey) -> Option<Upcast> {
///         if target == TypeKey::of::<Arc<dyn Named>>() {
///             let named: Arc<dyn Named> = Arc::new(self.clone());
///             return Some(Box::new(named));
///         }
///         None
///     }
/// }
/// ```
pub trait Message: Any + Clone + Send + Sync {
    /// Every supertype of this message, nearest first. Excludes `Self` and
    /// [`Envelope`], which are always assignable.
    fn supertypes() -> Vec<TypeKey> {
        Vec::new()
    }

    /// Convert this value into the supertype identified by `target`.
    ///
    /// Returns `None` when `target` is not one of [`Self::supertypes`].
    fn upcast(&self, target: TypeKey) -> Option<Upcast> {
        let _ = target;
        None
    }
}

/// The concrete type of a published value together with all of its supertypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    concrete: TypeKey,
    supertypes: Vec<TypeKey>,
}

impl Lineage {
    /// Lineage of message type `M`.
    pub fn of<M: Message>() -> Self {
        Self {
            concrete: TypeKey::of::<M>(),
            supertypes: M::supertypes(),
        }
    }

    /// The runtime type of the published value.
    pub fn concrete(&self) -> TypeKey {
        self.concrete
    }

    /// Declared supertypes, nearest first.
    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }
}

/// Whether a subscription declared against `declared` receives values with
/// the given lineage.
///
/// True for the concrete type itself, any of its declared supertypes, and the
/// root [`Envelope`] type.
pub fn is_assignable(declared: TypeKey, lineage: &Lineage) -> bool {
    declared == TypeKey::of::<Envelope>()
        || declared == lineage.concrete
        || lineage.supertypes.contains(&declared)
}

/// Build the value handed to a handler declared against `declared`.
pub(crate) fn argument_for<M: Message>(value: &Arc<M>, declared: TypeKey) -> Option<Upcast> {
    if declared == TypeKey::of::<M>() {
        return Some(Box::new(M::clone(value)));
    }
    if declared == TypeKey::of::<Envelope>() {
        let payload: Arc<dyn Any + Send + Sync> = value.clone();
        return Some(Box::new(Envelope {
            payload,
            key: TypeKey::of::<M>(),
        }));
    }
    value.upcast(declared)
}

/// Root of every message hierarchy.
///
/// Subscribing to `Envelope` receives every published value, type-erased.
/// The original value is shared, not cloned.
#[derive(Clone)]
pub struct Envelope {
    payload: Arc<dyn Any + Send + Sync>,
    key: TypeKey,
}

impl Envelope {
    /// Runtime type of the wrapped value.
    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// Type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    /// Whether the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Borrow the wrapped value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("type", &self.key)
            .finish_non_exhaustive()
    }
}

impl Message for Envelope {}

/// Implement [`Message`] for plain types or for structs embedding a base message.
///
/// - `message!(A, B, C);` makes each type a hierarchy root.
/// - `message!(Dog: Animal => animal);` declares `Animal` (and all of its
///   supertypes) as supertypes of `Dog`, upcasting through the `animal` field.
///
/// ```rust
/// use pubsub_hub::message;
/// use pubsub_hub::prelude::*;
///
/// #[derive(Clone)]
/// struct Animal;
/// #[derive(Clone)]
/// struct Dog { animal: Animal }
/// #[derive(Clone)]
/// struct Puppy { dog: Dog }
///
/// message!(Animal);
/// message!(Dog: Animal => animal);
/// message!(Puppy: Dog => dog);
///
/// assert_eq!(
///     Puppy::supertypes(),
///     vec![TypeKey::of::<Dog>(), TypeKey::of::<Animal>()]
/// );
/// ```
#[macro_export]
macro_rules! message {
    ($ty:ty : $base:ty => $field:ident) => {
        impl $crate::Message for $ty {
            fn supertypes() -> ::std::vec::Vec<$crate::TypeKey> {
                let mut types = ::std::vec![$crate::TypeKey::of::<$base>()];
                types.extend(<$base as $crate::Message>::supertypes());
                types
            }

            fn upcast(&self, target: $crate::TypeKey) -> ::std::option::Option<$crate::Upcast> {
                if target == $crate::TypeKey::of::<$base>() {
                    return ::std::option::Option::Some(::std::boxed::Box::new(
                        ::std::clone::Clone::clone(&self.$field),
                    ));
                }
                <$base as $crate::Message>::upcast(&self.$field, target)
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::Message for $ty {})+
    };
}
