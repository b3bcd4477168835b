//! Service registration types.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of, Key};
use crate::lifetime::Lifetime;
use crate::provider::Scope;
use crate::traits::{Construct, Dependencies, Implements, Service};

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Builds the concrete `Arc<Impl>` for scoped and transient registrations.
pub(crate) type Ctor = Arc<dyn Fn(&Scope) -> DiResult<AnyArc> + Send + Sync>;
/// Turns the concrete `Arc<Impl>` into `Arc<Arc<I>>` for interface consumers.
pub(crate) type Upcast = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;
/// Resolves handler parameters, obtains the instance at the given index and calls it.
pub(crate) type Invoker = Arc<dyn Fn(&Scope, usize) -> DiResult<()> + Send + Sync>;

/// Service registration with lifetime, constructor and handler
pub(crate) struct Registration {
    pub(crate) key: Key,
    pub(crate) impl_name: &'static str,
    pub(crate) lifetime: Lifetime,
    /// Constructor dependency keys, in declared order
    pub(crate) dependencies: Vec<Key>,
    /// Handler parameter keys, in declared order
    pub(crate) parameters: Vec<Key>,
    /// Present for scoped and transient registrations
    pub(crate) ctor: Option<Ctor>,
    pub(crate) upcast: Upcast,
    pub(crate) invoke: Invoker,
    /// Present for singleton registrations, set once at registration
    pub(crate) shared: Option<AnyArc>,
}

impl Registration {
    /// Singleton registration around an already constructed instance.
    pub(crate) fn singleton<I, T>(instance: T) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Service + Implements<I>,
    {
        Self {
            key: key_of::<I>(),
            impl_name: type_name::<T>(),
            lifetime: Lifetime::Singleton,
            dependencies: Vec::new(),
            parameters: T::Params::keys(),
            ctor: None,
            upcast: upcast::<I, T>(),
            invoke: invoker::<T>(),
            shared: Some(Arc::new(instance) as AnyArc),
        }
    }

    /// Scoped or transient registration built on demand by `T::construct`.
    pub(crate) fn constructed<I, T>(lifetime: Lifetime) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Service + Construct + Implements<I>,
    {
        debug_assert!(lifetime != Lifetime::Singleton);
        let ctor = move |scope: &Scope| -> DiResult<AnyArc> {
            let deps = T::Deps::resolve(scope)?;
            let instance = T::construct(deps).map_err(|err| DiError::Construction {
                service: type_name::<T>(),
                message: format!("{err:#}"),
            })?;
            Ok(Arc::new(instance) as AnyArc)
        };

        Self {
            key: key_of::<I>(),
            impl_name: type_name::<T>(),
            lifetime,
            dependencies: T::Deps::keys(),
            parameters: T::Params::keys(),
            ctor: Some(Arc::new(ctor)),
            upcast: upcast::<I, T>(),
            invoke: invoker::<T>(),
            shared: None,
        }
    }
}

fn upcast<I, T>() -> Upcast
where
    I: ?Sized + Send + Sync + 'static,
    T: Implements<I>,
{
    Arc::new(|instance: AnyArc| -> DiResult<AnyArc> {
        let concrete = instance
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(type_name::<T>()))?;
        let interface: Arc<I> = <T as Implements<I>>::upcast(concrete);
        // Stored as Arc<Arc<I>> so unsized interfaces survive the trip through Any
        Ok(Arc::new(interface) as AnyArc)
    })
}

fn invoker<T: Service>() -> Invoker {
    Arc::new(|scope: &Scope, index: usize| -> DiResult<()> {
        let params = T::Params::resolve(scope)?;
        let instance = scope
            .instance_at(index)?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(type_name::<T>()))?;
        instance
            .handle(params)
            .map_err(|err| DiError::HandlerInvocation {
                service: type_name::<T>(),
                message: format!("{err:#}"),
            })
    })
}

/// Frozen, ordered service registry
pub(crate) struct Registry {
    /// Registration order is dispatch order
    pub(crate) registrations: Vec<Registration>,
    /// First registration index per interface key
    index: HashMap<Key, usize>,
}

impl Registry {
    pub(crate) fn new(registrations: Vec<Registration>) -> Self {
        let mut index = HashMap::with_capacity(registrations.len());
        for (position, registration) in registrations.iter().enumerate() {
            // First registration wins for resolution
            index.entry(registration.key).or_insert(position);
        }
        Self {
            registrations,
            index,
        }
    }

    /// Index of the first registration for a key
    #[inline]
    pub(crate) fn position(&self, key: &Key) -> Option<usize> {
        self.index.get(key).copied()
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<&Registration> {
        self.registrations.get(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }
}
