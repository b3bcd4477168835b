//! Service, constructor and interface-binding traits.

use std::sync::Arc;

use super::Dependencies;

/// A unit of work dispatched by the pipeline on every request.
///
/// `Params` is the typed list of interfaces the handler needs, resolved
/// against the current request scope in declared order right before
/// `handle` is called. Declare it as `()`, a single `Arc<I>`, or a tuple of
/// `Arc<I>` values. `Arc<HttpRequest>` and `Arc<HttpResponse>` resolve to the
/// live transport objects.
///
/// # Examples
///
/// ```
/// use ferrous_host::{HttpRequest, HttpResponse, Service};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Echo;
///
/// impl Service for Echo {
///     type Params = (Arc<HttpRequest>, Arc<HttpResponse>);
///
///     fn handle(&self, (request, response): Self::Params) -> anyhow::Result<()> {
///         response.write_str(request.raw_url())?;
///         Ok(())
///     }
/// }
/// ```
pub trait Service: Send + Sync + 'static {
    /// Interfaces the handler receives, in declared order.
    type Params: Dependencies;

    /// Runs this service for the current request.
    fn handle(&self, params: Self::Params) -> anyhow::Result<()>;
}

/// Construction of scoped and transient services from injected dependencies.
///
/// `Deps` is resolved recursively from the request scope before
/// `construct` runs. Singletons do not use this trait: they are built with
/// `Default` at registration time and cannot receive dependencies.
pub trait Construct: Sized {
    /// Interfaces the constructor receives, in declared order.
    type Deps: Dependencies;

    /// Builds a new instance from its resolved dependencies.
    fn construct(deps: Self::Deps) -> anyhow::Result<Self>;
}

/// Binding from a concrete implementation to an interface it satisfies.
///
/// Every type implements `Implements<Self>`, so a service can always be
/// registered under its own type. Binding to a trait object is one line with
/// the [`implements!`](crate::implements) macro.
pub trait Implements<I: ?Sized>: Send + Sync + 'static {
    /// Views the shared instance through the interface.
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares that a type implements one or more trait-object interfaces.
///
/// ```
/// use ferrous_host::{implements, Implements};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> &'static str;
/// }
///
/// struct Hello;
/// impl Greeter for Hello {
///     fn greet(&self) -> &'static str { "hello" }
/// }
///
/// implements!(Hello => dyn Greeter);
///
/// let greeter: Arc<dyn Greeter> = <Hello as Implements<dyn Greeter>>::upcast(Arc::new(Hello));
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty => $($iface:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$iface> for $ty {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$iface> {
                    self
                }
            }
        )+
    };
}
