//! Per-request dispatch of every registered service.
//!
//! The pipeline is transport-agnostic: the host feeds it one request and
//! response at a time, and tests can drive it directly.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error, info, info_span};

use crate::error::DiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::internal::panic_message;
use crate::provider::ServiceProvider;

/// Lifecycle of one request inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Accepted,
    SnapshotBuilt,
    /// Running the service at this registration index
    Dispatching(usize),
    /// A service failed; the rest were skipped
    Aborted,
    Completed,
    Closed,
}

/// What happened to one dispatched request.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub request_id: u64,
    /// Final response status
    pub status: StatusCode,
    /// Implementation names of the services that completed, in order
    pub invoked: Vec<&'static str>,
    /// The error that aborted the request, if any
    pub error: Option<DiError>,
    /// States the request went through, `Accepted` first and `Closed` last
    pub states: Vec<RequestState>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs every registered service, in registration order, for each request.
///
/// Each request gets its own [`Scope`](crate::Scope). A failing service
/// (error, panic, or an unresolvable dependency) turns the response into a
/// `500`, discards whatever body was written, and skips the services after
/// it. The response is closed in every case.
///
/// # Examples
///
/// ```
/// use ferrous_host::{HttpRequest, HttpResponse, Pipeline, Service, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Hello;
/// impl Service for Hello {
///     type Params = (Arc<HttpRequest>, Arc<HttpResponse>);
///     fn handle(&self, (request, response): Self::Params) -> anyhow::Result<()> {
///         response.write_str(&format!("hello {}", request.raw_url()))?;
///         Ok(())
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Hello, Hello>();
/// let pipeline = Pipeline::new(services.build());
///
/// let response = Arc::new(HttpResponse::new());
/// let outcome = pipeline.dispatch(HttpRequest::default(), response.clone());
/// assert!(outcome.is_success());
/// assert_eq!(&response.body()[..], b"hello /");
/// assert!(response.is_closed());
/// ```
pub struct Pipeline {
    provider: ServiceProvider,
    next_request_id: AtomicU64,
}

impl Pipeline {
    pub fn new(provider: ServiceProvider) -> Self {
        Self {
            provider,
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    /// Dispatches one request synchronously on the calling thread.
    pub fn dispatch(&self, request: HttpRequest, response: Arc<HttpResponse>) -> DispatchOutcome {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let span = info_span!(
            "dispatch",
            request_id,
            method = %request.method(),
            url = request.raw_url()
        );
        let _entered = span.enter();

        let mut states = vec![RequestState::Accepted];
        let scope = self.provider.create_scope_with(request, response.clone());
        states.push(RequestState::SnapshotBuilt);

        let registry = self.provider.registry();
        let mut invoked = Vec::with_capacity(registry.len());
        let mut failure = None;

        for (index, registration) in registry.iter().enumerate() {
            states.push(RequestState::Dispatching(index));
            debug!(
                service = registration.impl_name,
                lifetime = %registration.lifetime,
                "invoking service"
            );

            let result = catch_unwind(AssertUnwindSafe(|| (registration.invoke)(&scope, index)))
                .unwrap_or_else(|payload| {
                    Err(DiError::HandlerInvocation {
                        service: registration.impl_name,
                        message: format!("panicked: {}", panic_message(payload.as_ref())),
                    })
                });

            match result {
                Ok(()) => invoked.push(registration.impl_name),
                Err(err) => {
                    response.fail(StatusCode::INTERNAL_SERVER_ERROR);
                    error!(service = registration.impl_name, error = %err, "request aborted");
                    self.provider.observers().failed(registration.impl_name, &err);
                    states.push(RequestState::Aborted);
                    failure = Some(err);
                    break;
                }
            }
        }

        if failure.is_none() {
            states.push(RequestState::Completed);
        }
        response.finalize();
        states.push(RequestState::Closed);

        let status = response.status();
        info!(status = status.as_u16(), services = invoked.len(), "request completed");

        DispatchOutcome {
            request_id,
            status,
            invoked,
            error: failure,
            states,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.provider)
            .field("next_request_id", &self.next_request_id)
            .finish()
    }
}
