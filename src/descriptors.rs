//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::Registration;

/// Service descriptor for introspection and diagnostics
///
/// A read-only record of one registration: the interface it answers for,
/// its lifetime, the implementation behind it, and the interfaces its
/// constructor and handler declare. Descriptors come back in registration
/// order, which is also the order the pipeline dispatches in.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{implements, Construct, HttpResponse, Lifetime, Service, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
///
/// #[derive(Default)]
/// struct SystemClock;
/// impl Clock for SystemClock {}
/// impl Service for SystemClock {
///     type Params = ();
///     fn handle(&self, _: ()) -> anyhow::Result<()> { Ok(()) }
/// }
/// implements!(SystemClock => dyn Clock);
///
/// struct Stamp;
/// impl Construct for Stamp {
///     type Deps = (Arc<dyn Clock>,);
///     fn construct(_: Self::Deps) -> anyhow::Result<Self> { Ok(Stamp) }
/// }
/// impl Service for Stamp {
///     type Params = (Arc<HttpResponse>,);
///     fn handle(&self, _: Self::Params) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_singleton::<dyn Clock, SystemClock>()
///     .add_transient::<Stamp, Stamp>();
///
/// let descriptors = services.descriptors();
/// assert!(descriptors[0].type_name().contains("Clock"));
/// assert!(descriptors[0].has_shared_instance);
/// assert_eq!(descriptors[1].lifetime, Lifetime::Transient);
/// assert!(descriptors[1].dependencies[0].display_name().contains("Clock"));
/// assert!(descriptors[1].parameters[0].display_name().contains("HttpResponse"));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The interface key this registration answers for
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Implementation type name
    pub impl_type_name: &'static str,
    /// Constructor dependencies, in declared order
    pub dependencies: Vec<Key>,
    /// Handler parameters, in declared order
    pub parameters: Vec<Key>,
    /// Whether a shared instance was supplied at registration (singletons)
    pub has_shared_instance: bool,
}

impl ServiceDescriptor {
    /// Get the interface name
    ///
    /// This is the `std::any::type_name` of the interface the service is
    /// registered under, e.g. `dyn my_app::Clock`.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }
}

impl From<&Registration> for ServiceDescriptor {
    fn from(registration: &Registration) -> Self {
        Self {
            key: registration.key,
            lifetime: registration.lifetime,
            impl_type_name: registration.impl_name,
            dependencies: registration.dependencies.clone(),
            parameters: registration.parameters.clone(),
            has_shared_instance: registration.shared.is_some(),
        }
    }
}
