//! Service provider module for request dispatch.
//!
//! This module contains the ServiceProvider type, the frozen result of a
//! [`ServiceCollection`](crate::ServiceCollection), and the per-request
//! [`Scope`] it creates.

use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::key::key_of;
use crate::observer::Observers;
use crate::registration::Registry;

mod scope;
pub use scope::Scope;

/// Service provider built from a service collection.
///
/// The provider owns the ordered registry and every singleton instance. It
/// never changes after `build`, so it is shared freely between the accept
/// loop and every in-flight request.
///
/// # Thread Safety
///
/// ServiceProvider is cheap to clone (it uses `Arc` internally) and can be
/// moved across threads. Singleton instances are shared by concurrent
/// requests and must synchronize their own state.
///
/// # Examples
///
/// ```
/// use ferrous_host::{HttpRequest, Service, ServiceCollection};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Hits(AtomicUsize);
///
/// impl Service for Hits {
///     type Params = ();
///     fn handle(&self, _: ()) -> anyhow::Result<()> {
///         self.0.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Hits, Hits>();
/// let provider = services.build();
///
/// let a = provider.get_singleton::<Hits>().unwrap();
/// let b = provider
///     .create_scope(HttpRequest::default())
///     .resolve::<Hits>()
///     .unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    registry: Registry,
    observers: Observers,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, observers: Observers) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                observers,
            }),
        }
    }

    #[inline]
    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    #[inline]
    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.observers
    }

    /// Creates the scope for one request, with a fresh `200 OK` response.
    pub fn create_scope(&self, request: HttpRequest) -> Scope {
        self.create_scope_with(request, Arc::new(HttpResponse::new()))
    }

    /// Creates the scope for one request around a caller-owned response.
    ///
    /// Every scoped slot starts empty; no instance from an earlier scope is
    /// visible here.
    pub fn create_scope_with(&self, request: HttpRequest, response: Arc<HttpResponse>) -> Scope {
        Scope::new(self.clone(), Arc::new(request), response)
    }

    /// Returns the shared instance of a singleton interface.
    ///
    /// # Errors
    ///
    /// [`DiError::MissingDependency`] when nothing is registered for `I`, or
    /// [`DiError::MissingSingleton`] when the first registration for `I` is
    /// not a singleton.
    pub fn get_singleton<I>(&self) -> DiResult<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = key_of::<I>();
        let registration = self
            .registry()
            .position(&key)
            .and_then(|index| self.registry().get(index))
            .ok_or(DiError::MissingDependency(key.display_name()))?;
        let shared = registration
            .shared
            .clone()
            .ok_or(DiError::MissingSingleton(key.display_name()))?;
        (registration.upcast)(shared)?
            .downcast::<Arc<I>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(key.display_name()))
    }

    /// Descriptors of every registration, in dispatch order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry().iter().map(ServiceDescriptor::from).collect()
    }

    /// Number of registrations, duplicates included.
    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        let names = |keys: &[crate::Key]| {
            keys.iter()
                .map(|k| k.display_name())
                .collect::<Vec<_>>()
                .join(", ")
        };
        for (position, r) in self.registry().iter().enumerate() {
            s.push_str(&format!(
                "  #{position} {} => {} ({})\n",
                r.key.display_name(),
                r.impl_name,
                r.lifetime
            ));
            s.push_str(&format!("      deps: [{}]\n", names(&r.dependencies)));
            s.push_str(&format!("      params: [{}]\n", names(&r.parameters)));
        }
        s
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.len())
            .finish()
    }
}
