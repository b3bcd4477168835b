//! # ferrous-host
//!
//! A minimal request-dispatch runtime built on lifetime-aware dependency
//! injection. Every registered service runs once per HTTP request, in
//! registration order, with its dependencies resolved per lifetime.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton, Scoped (one per request), and Transient
//! - **Typed injection**: constructor dependencies and handler parameters are declared as tuples of `Arc<I>`
//! - **Failure isolation**: a failing service turns its request into a 500 and nothing else
//! - **Bounded concurrency**: a per-request dispatch semaphore with wait or reject overload policy
//! - **Circular dependency detection**: construction cycles fail with the full path
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_host::{Construct, HttpRequest, HttpResponse, Pipeline, Service, ServiceCollection};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! // Shared by every request
//! #[derive(Default)]
//! struct Visits(AtomicUsize);
//!
//! impl Service for Visits {
//!     type Params = ();
//!     fn handle(&self, _: ()) -> anyhow::Result<()> {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! // Built once per request
//! struct Greeting {
//!     visits: Arc<Visits>,
//! }
//!
//! impl Construct for Greeting {
//!     type Deps = (Arc<Visits>,);
//!     fn construct((visits,): Self::Deps) -> anyhow::Result<Self> {
//!         Ok(Self { visits })
//!     }
//! }
//!
//! impl Service for Greeting {
//!     type Params = (Arc<HttpRequest>, Arc<HttpResponse>);
//!     fn handle(&self, (request, response): Self::Params) -> anyhow::Result<()> {
//!         let count = self.visits.0.load(Ordering::SeqCst);
//!         response.write_str(&format!("visit {count} to {}", request.raw_url()))?;
//!         Ok(())
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services
//!     .add_singleton::<Visits, Visits>()
//!     .add_scoped::<Greeting, Greeting>();
//!
//! let pipeline = Pipeline::new(services.build());
//! let response = Arc::new(HttpResponse::new());
//! pipeline.dispatch(HttpRequest::default(), response.clone());
//! assert_eq!(&response.body()[..], b"visit 1 to /");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created at registration and shared by every request
//! - **Scoped**: Created once per request, on first use
//! - **Transient**: Created fresh on every resolution
//!
//! ## Trait Interfaces
//!
//! Services are registered under an interface type `I`, which is either the
//! implementation itself or a trait object bound with [`implements!`].
//!
//! ```rust
//! use ferrous_host::{implements, HttpRequest, Service, ServiceCollection};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! #[derive(Default)]
//! struct FixedClock;
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 { 42 }
//! }
//! impl Service for FixedClock {
//!     type Params = ();
//!     fn handle(&self, _: ()) -> anyhow::Result<()> { Ok(()) }
//! }
//! implements!(FixedClock => dyn Clock);
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton::<dyn Clock, FixedClock>();
//!
//! let provider = services.build();
//! let scope = provider.create_scope(HttpRequest::default());
//! assert_eq!(scope.resolve::<dyn Clock>().unwrap().now(), 42);
//! ```
//!
//! ## Hosting
//!
//! [`WebHost`] serves the pipeline over HTTP/1.1. See [`HostOptions`] for
//! the listener and concurrency settings.

pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod host;
pub mod http;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod pipeline;
pub mod provider;
pub mod traits;
pub mod validation;

mod internal;
mod registration;

pub use collection::ServiceCollection;
pub use config::{ConfigError, ConfigSource, EnvironmentConfigSource, HostOptions, MapConfigSource, OverloadPolicy};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use host::{HostError, RunningHost, ShutdownToken, WebHost};
pub use self::http::{HttpRequest, HttpResponse};
pub use key::{key_of, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, TracingObserver};
pub use pipeline::{DispatchOutcome, Pipeline, RequestState};
pub use provider::{Scope, ServiceProvider};
pub use traits::{Construct, Dependencies, Dependency, Implements, Service};
pub use validation::{ValidationError, ValidationResult, ValidationWarning};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Construct for Counted {
        type Deps = ();
        fn construct(_: ()) -> anyhow::Result<Self> {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(Counted)
        }
    }

    impl Service for Counted {
        type Params = ();
        fn handle(&self, _: ()) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Shared;

    impl Service for Shared {
        type Params = ();
        fn handle(&self, _: ()) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_singleton_resolution() {
        let mut sc = ServiceCollection::new();
        sc.add_singleton::<Shared, Shared>();

        let sp = sc.build();
        let a = sp.get_singleton::<Shared>().unwrap();
        let scope = sp.create_scope(HttpRequest::default());
        let b = scope.resolve::<Shared>().unwrap();

        assert!(Arc::ptr_eq(&a, &b)); // Same instance
    }

    #[test]
    fn test_transient_resolution() {
        let mut sc = ServiceCollection::new();
        sc.add_transient::<Counted, Counted>();

        let sp = sc.build();
        let scope = sp.create_scope(HttpRequest::default());
        let before = BUILT.load(Ordering::SeqCst);
        let a = scope.resolve::<Counted>().unwrap();
        let b = scope.resolve::<Counted>().unwrap();

        assert!(!Arc::ptr_eq(&a, &b)); // Different instances
        assert!(BUILT.load(Ordering::SeqCst) >= before + 2);
    }

    #[test]
    fn test_transport_objects_resolve_to_scope() {
        let sp = ServiceCollection::new().build();
        let scope = sp.create_scope(HttpRequest::default().with_body("ping"));

        let request = scope.resolve::<HttpRequest>().unwrap();
        let response = scope.resolve::<HttpResponse>().unwrap();
        assert!(Arc::ptr_eq(&request, scope.request()));
        assert!(Arc::ptr_eq(&response, scope.response()));
        assert_eq!(&request.body()[..], b"ping");
    }

    #[test]
    fn test_try_resolve_missing_is_none() {
        let sp = ServiceCollection::new().build();
        let scope = sp.create_scope(HttpRequest::default());
        assert!(scope.try_resolve::<Shared>().unwrap().is_none());
    }
}
