//! Service collection module for request dispatch.
//!
//! This module contains the ServiceCollection type, the mutable builder
//! services are registered on before the host starts. Registration order is
//! dispatch order.

use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::provider::ServiceProvider;
use crate::registration::{Registration, Registry};
use crate::traits::{Construct, Implements, Service};
use crate::validation::{self, ValidationError, ValidationResult};

/// Ordered list of service registrations.
///
/// Every registered service is dispatched once per request, in the order it
/// was added. An interface may be registered more than once: each
/// registration is dispatched, and resolution of the interface returns the
/// first one.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{HttpResponse, Service, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Banner;
/// impl Service for Banner {
///     type Params = Arc<HttpResponse>;
///     fn handle(&self, response: Arc<HttpResponse>) -> anyhow::Result<()> {
///         response.write_str("hello")?;
///         Ok(())
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Banner, Banner>();
/// assert_eq!(services.len(), 1);
///
/// let provider = services.build();
/// assert_eq!(provider.len(), 1);
/// ```
pub struct ServiceCollection {
    registrations: Vec<Registration>,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            observers: Observers::new(),
        }
    }

    // ----- Registrations -----

    /// Registers a singleton under interface `I`, built now with `T::default()`.
    ///
    /// The instance is created immediately and shared by every request for
    /// the life of the provider. Singletons receive no constructor
    /// dependencies; their handler can still declare `Params`.
    pub fn add_singleton<I, T>(&mut self) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Service + Default + Implements<I>,
    {
        self.add_singleton_instance::<I, T>(T::default())
    }

    /// Registers an already constructed singleton under interface `I`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_host::{Service, ServiceCollection};
    ///
    /// struct Config { greeting: String }
    /// impl Service for Config {
    ///     type Params = ();
    ///     fn handle(&self, _: ()) -> anyhow::Result<()> { Ok(()) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_instance::<Config, _>(Config { greeting: "hi".into() });
    /// let provider = services.build();
    /// assert_eq!(provider.get_singleton::<Config>().unwrap().greeting, "hi");
    /// ```
    pub fn add_singleton_instance<I, T>(&mut self, instance: T) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Service + Implements<I>,
    {
        self.push(Registration::singleton::<I, T>(instance))
    }

    /// Registers a scoped service under interface `I`.
    ///
    /// One instance is constructed per request, on first use, and shared by
    /// every consumer in that request.
    pub fn add_scoped<I, T>(&mut self) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Service + Construct + Implements<I>,
    {
        self.push(Registration::constructed::<I, T>(Lifetime::Scoped))
    }

    /// Registers a transient service under interface `I`.
    ///
    /// A new instance is constructed on every resolution, including the one
    /// the pipeline makes to dispatch it.
    pub fn add_transient<I, T>(&mut self) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Service + Construct + Implements<I>,
    {
        self.push(Registration::constructed::<I, T>(Lifetime::Transient))
    }

    fn push(&mut self, registration: Registration) -> &mut Self {
        tracing::debug!(
            interface = registration.key.display_name(),
            implementation = registration.impl_name,
            lifetime = %registration.lifetime,
            "registered service"
        );
        self.registrations.push(registration);
        self
    }

    // ----- Introspection -----

    /// Descriptors of every registration, in dispatch order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registrations
            .iter()
            .map(ServiceDescriptor::from)
            .collect()
    }

    /// Number of registrations, duplicates included.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    // ----- Observers -----

    /// Adds a diagnostic observer for resolution and dispatch events.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    // ----- Build -----

    /// Checks that every declared dependency is satisfiable and acyclic.
    pub fn validate(&self) -> ValidationResult {
        validation::validate(&self.registrations)
    }

    /// Freezes the collection into a provider.
    ///
    /// Configuration errors are not checked here; they surface per request.
    /// Use [`build_validated`](Self::build_validated) to fail fast instead.
    pub fn build(self) -> ServiceProvider {
        tracing::debug!(services = self.registrations.len(), "building service provider");
        ServiceProvider::new(Registry::new(self.registrations), self.observers)
    }

    /// Validates, logs any warnings, then builds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn build_validated(self) -> Result<ServiceProvider, ValidationError> {
        let result = self.validate();
        for warning in &result.warnings {
            tracing::warn!(%warning, "service configuration warning");
        }
        if let Some(error) = result.errors.into_iter().next() {
            return Err(error);
        }
        Ok(self.build())
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}
