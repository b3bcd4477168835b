//! Diagnostic observers for resolution and dispatch.
//!
//! Observers receive synchronous callbacks while the resolver works. Keep
//! implementations cheap: they run on the request's dispatch thread.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::Key;

/// Observer trait for dependency injection resolution events.
///
/// # Examples
///
/// ```
/// use ferrous_host::{DiError, DiObserver, Key, ServiceCollection};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl DiObserver for PrintObserver {
///     fn resolving(&self, key: &Key) {
///         println!("resolving {}", key.display_name());
///     }
///
///     fn resolved(&self, key: &Key, duration: Duration) {
///         println!("resolved {} in {:?}", key.display_name(), duration);
///     }
///
///     fn failed(&self, service: &'static str, error: &DiError) {
///         println!("{service} failed: {error}");
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(PrintObserver));
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before an interface is resolved.
    fn resolving(&self, key: &Key);

    /// Called after an interface resolved successfully.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when resolving an interface fails. Every `resolving` call is
    /// followed by exactly one `resolved` or `resolve_failed` for the same key.
    fn resolve_failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }

    /// Called when a dispatched service fails and its request is aborted.
    fn failed(&self, service: &'static str, error: &DiError) {
        let _ = (service, error);
    }
}

/// Observer that forwards every event to `tracing` at trace/warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(interface = key.display_name(), "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::trace!(
            interface = key.display_name(),
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn resolve_failed(&self, key: &Key, error: &DiError) {
        tracing::debug!(interface = key.display_name(), %error, "resolution failed");
    }

    fn failed(&self, service: &'static str, error: &DiError) {
        tracing::warn!(service, %error, "service failed");
    }
}

/// Registered observers, shared by the provider and its scopes.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn resolve_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolve_failed(key, error);
        }
    }

    pub(crate) fn failed(&self, service: &'static str, error: &DiError) {
        for observer in &self.observers {
            observer.failed(service, error);
        }
    }
}
