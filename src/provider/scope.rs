//! Per-request snapshot and lifetime-aware resolution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::ServiceProvider;
use crate::error::{DiError, DiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::internal::{Frame, ResolutionGuard};
use crate::key::{key_of, Key};
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Registration};

/// Request scope: the snapshot of one request's services.
///
/// A `Scope` carries the request and response of a single dispatch, the
/// lazily filled scoped slots, and a handle to the root provider for
/// singletons. Scoped instances created through a scope are shared by every
/// consumer within it and dropped with it; nothing crosses into the next
/// request.
///
/// # Lifetime Behavior
///
/// - **Singleton**: Handed out from the provider, shared by all scopes
/// - **Scoped**: Built on first use in this scope, then reused
/// - **Transient**: Built fresh on every resolution
///
/// # Examples
///
/// ```
/// use ferrous_host::{Construct, HttpRequest, Service, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Connection;
/// impl Construct for Connection {
///     type Deps = ();
///     fn construct(_: ()) -> anyhow::Result<Self> { Ok(Connection) }
/// }
/// impl Service for Connection {
///     type Params = ();
///     fn handle(&self, _: ()) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped::<Connection, Connection>();
/// let provider = services.build();
///
/// let scope = provider.create_scope(HttpRequest::default());
/// let first = scope.resolve::<Connection>().unwrap();
/// let second = scope.resolve::<Connection>().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct Scope {
    root: ServiceProvider,
    request: Arc<HttpRequest>,
    response: Arc<HttpResponse>,
    // Registration index -> scoped instance, filled on first use
    scoped: Mutex<HashMap<usize, AnyArc>>,
    // Construction stack for circular detection, one frame per registration
    resolving: Mutex<Vec<Frame>>,
}

impl Scope {
    pub(crate) fn new(
        root: ServiceProvider,
        request: Arc<HttpRequest>,
        response: Arc<HttpResponse>,
    ) -> Self {
        Self {
            root,
            request,
            response,
            scoped: Mutex::new(HashMap::new()),
            resolving: Mutex::new(Vec::new()),
        }
    }

    /// The request this scope was created for.
    pub fn request(&self) -> &Arc<HttpRequest> {
        &self.request
    }

    /// The response every service of this request writes to.
    pub fn response(&self) -> &Arc<HttpResponse> {
        &self.response
    }

    /// The provider this scope resolves singletons from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.root
    }

    /// Resolves an interface, honoring the lifetime of the registration
    /// that satisfies it.
    ///
    /// `HttpRequest` and `HttpResponse` resolve to this scope's transport
    /// objects. Anything else goes through the registry, where the first
    /// registration for the interface wins.
    ///
    /// # Errors
    ///
    /// - [`DiError::MissingDependency`] when nothing is registered for `I`
    /// - [`DiError::Construction`] when a constructor in the chain fails
    /// - [`DiError::Circular`] when construction re-enters itself
    pub fn resolve<I>(&self) -> DiResult<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = key_of::<I>();
        let any = self.resolve_any(&key)?;
        any.downcast::<Arc<I>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(key.display_name()))
    }

    /// Like [`resolve`](Self::resolve), but maps a missing registration to `None`.
    pub fn try_resolve<I>(&self) -> DiResult<Option<Arc<I>>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        match self.resolve::<I>() {
            Ok(value) => Ok(Some(value)),
            Err(DiError::MissingDependency(name)) if name == key_of::<I>().display_name() => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Resolves a key to an `Arc<Arc<I>>` behind `Any`.
    pub(crate) fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        if *key == key_of::<HttpRequest>() {
            return Ok(Arc::new(self.request.clone()) as AnyArc);
        }
        if *key == key_of::<HttpResponse>() {
            return Ok(Arc::new(self.response.clone()) as AnyArc);
        }

        let observers = self.root.observers();
        let started = observers.has_observers().then(|| {
            observers.resolving(key);
            Instant::now()
        });

        let result = self.resolve_registered(key);

        if let Some(started) = started {
            match &result {
                Ok(_) => observers.resolved(key, started.elapsed()),
                Err(err) => observers.resolve_failed(key, err),
            }
        }
        result
    }

    fn resolve_registered(&self, key: &Key) -> DiResult<AnyArc> {
        let registry = self.root.registry();
        let index = registry
            .position(key)
            .ok_or(DiError::MissingDependency(key.display_name()))?;
        let registration = registry
            .get(index)
            .ok_or(DiError::MissingDependency(key.display_name()))?;

        let instance = self.instance_at(index)?;
        (registration.upcast)(instance)
    }

    /// Concrete instance of the registration at `index`, per its lifetime.
    pub(crate) fn instance_at(&self, index: usize) -> DiResult<AnyArc> {
        let registration = self
            .root
            .registry()
            .get(index)
            .ok_or(DiError::MissingDependency("<unknown registration>"))?;

        match registration.lifetime {
            Lifetime::Singleton => registration
                .shared
                .clone()
                .ok_or(DiError::MissingSingleton(registration.impl_name)),
            Lifetime::Scoped => {
                if let Some(existing) = self.scoped.lock().get(&index) {
                    return Ok(existing.clone());
                }
                // Constructed without the lock held so dependencies can resolve
                let created = self.construct(index, registration)?;
                let mut slots = self.scoped.lock();
                Ok(slots.entry(index).or_insert(created).clone())
            }
            Lifetime::Transient => self.construct(index, registration),
        }
    }

    fn construct(&self, index: usize, registration: &Registration) -> DiResult<AnyArc> {
        let ctor = registration
            .ctor
            .as_ref()
            .ok_or(DiError::MissingSingleton(registration.impl_name))?;
        let frame = Frame::new(index, registration.key.display_name());
        let _guard = ResolutionGuard::enter(&self.resolving, frame)?;
        ctor(self)
    }
}
