//! Error types for resolution and dispatch.

use thiserror::Error;

/// Dependency injection errors
///
/// Represents the failures that can occur while resolving a service or
/// invoking its handler. The pipeline catches every one of them per request:
/// the response becomes a 500 and the remaining services are skipped.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{DiError, HttpRequest, ServiceCollection};
///
/// trait Unregistered: Send + Sync {}
///
/// let provider = ServiceCollection::new().build();
/// let scope = provider.create_scope(HttpRequest::default());
/// match scope.resolve::<dyn Unregistered>() {
///     Err(DiError::MissingDependency(name)) => assert!(name.contains("Unregistered")),
///     _ => unreachable!(),
/// }
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// No registration satisfies a required interface
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),
    /// A singleton registration lost its shared instance
    #[error("Singleton has no shared instance: {0}")]
    MissingSingleton(&'static str),
    /// A service handler returned an error or panicked
    #[error("Service {service} failed: {message}")]
    HandlerInvocation {
        service: &'static str,
        message: String,
    },
    /// A scoped or transient constructor returned an error
    #[error("Failed to construct {service}: {message}")]
    Construction {
        service: &'static str,
        message: String,
    },
    /// A stored instance could not be downcast to the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum construction depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    /// Name of the service or interface the error is about.
    pub fn subject(&self) -> &'static str {
        match self {
            DiError::MissingDependency(name)
            | DiError::MissingSingleton(name)
            | DiError::TypeMismatch(name) => name,
            DiError::HandlerInvocation { service, .. } | DiError::Construction { service, .. } => {
                service
            }
            DiError::Circular(path) => path.last().copied().unwrap_or("<empty>"),
            DiError::DepthExceeded(_) => "<depth>",
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
