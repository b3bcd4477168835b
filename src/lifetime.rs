//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// Defines how service instances are created, cached, and shared between
/// the requests dispatched by the pipeline.
///
/// # Lifetime Characteristics
///
/// - **Singleton**: Built once at registration, shared by every request
/// - **Scoped**: Built on first use within a request, shared inside that request
/// - **Transient**: Built on every resolution, never shared
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{Construct, HttpRequest, Lifetime, Service, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
/// impl Service for Database {
///     type Params = ();
///     fn handle(&self, _: ()) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// struct Repository { db: Arc<Database> }
/// impl Construct for Repository {
///     type Deps = (Arc<Database>,);
///     fn construct((db,): Self::Deps) -> anyhow::Result<Self> { Ok(Self { db }) }
/// }
/// impl Service for Repository {
///     type Params = ();
///     fn handle(&self, _: ()) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_singleton::<Database, Database>()
///     .add_scoped::<Repository, Repository>();
///
/// let descriptors = services.descriptors();
/// assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
/// assert_eq!(descriptors[1].lifetime, Lifetime::Scoped);
///
/// let provider = services.build();
///
/// // Scoped: same within a request, different across requests
/// let scope1 = provider.create_scope(HttpRequest::default());
/// let repo1a = scope1.resolve::<Repository>().unwrap();
/// let repo1b = scope1.resolve::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = provider.create_scope(HttpRequest::default());
/// let repo2 = scope2.resolve::<Repository>().unwrap();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
///
/// // Singleton: the same instance behind every scoped repository
/// assert!(Arc::ptr_eq(&repo1a.db, &repo2.db));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per provider, created at registration time
    ///
    /// Singleton services are constructed eagerly when registered, without
    /// any injected dependencies, and the same instance is handed to every
    /// request for the life of the process. Their internal state is shared
    /// by concurrent requests, so it must be synchronized.
    Singleton,
    /// Single instance per request
    ///
    /// Scoped services are created on first resolution within a request.
    /// Every consumer in that request receives the same instance; the next
    /// request starts with an empty slot.
    Scoped,
    /// New instance per resolution, never cached
    ///
    /// Transient services create a fresh instance every time they are
    /// resolved, even twice within the same request.
    Transient,
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        };
        f.write_str(name)
    }
}
