//! Instance resolution.
//!
//! Handlers and argument builders are declared against a class (a Rust type).
//! When a command runs, the engine asks a [`Resolver`] for a live instance of
//! that class by its [`ClassKey`]. How instances are created and how long they
//! live is the resolver's business.
//!
//! [`Services`] is the provided implementation: a type map of pre-built
//! instances, shared through `Arc`.
//!
//! ```rust
//! use switchyard_dispatch::{ClassKey, Resolver, Services};
//!
//! struct Database { url: String }
//!
//! let mut services = Services::new();
//! services.insert(Database { url: "sqlite://app.db".into() });
//!
//! let db = services.get::<Database>().unwrap();
//! assert_eq!(db.url, "sqlite://app.db");
//! assert!(services.resolve(&ClassKey::of::<Database>()).is_ok());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::ClassKey;
use crate::error::DispatchError;

/// A live, shareable instance handed out by a resolver.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Supplies live instances of handler and builder classes.
pub trait Resolver: Send + Sync {
    fn resolve(&self, class: &ClassKey) -> Result<Instance, DispatchError>;
}

impl<F> Resolver for F
where
    F: Fn(&ClassKey) -> Result<Instance, DispatchError> + Send + Sync,
{
    fn resolve(&self, class: &ClassKey) -> Result<Instance, DispatchError> {
        self(class)
    }
}

/// Downcasts a resolved instance to the concrete class.
pub(crate) fn downcast_instance<T>(instance: Instance) -> Result<Arc<T>, DispatchError>
where
    T: Send + Sync + 'static,
{
    instance.downcast::<T>().map_err(|_| DispatchError::Resolve {
        class: std::any::type_name::<T>().to_string(),
        reason: "resolver returned an instance of a different type".to_string(),
    })
}

/// Type map of pre-built instances.
///
/// Each type is stored once; inserting a second value of the same type
/// replaces the first. Instances are shared, never cloned.
#[derive(Default, Clone)]
pub struct Services {
    map: HashMap<TypeId, Instance>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an instance, returning `true` if one of the same type was replaced.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> bool {
        self.map
            .insert(TypeId::of::<T>(), Arc::new(value))
            .is_some()
    }

    /// Inserts an already shared instance.
    pub fn insert_arc<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> bool {
        self.map.insert(TypeId::of::<T>(), value).is_some()
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.map
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|instance| instance.downcast::<T>().ok())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Resolver for Services {
    fn resolve(&self, class: &ClassKey) -> Result<Instance, DispatchError> {
        self.map
            .get(&class.id())
            .cloned()
            .ok_or_else(|| DispatchError::Resolve {
                class: class.name().to_string(),
                reason: "no instance registered".to_string(),
            })
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}
