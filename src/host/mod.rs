//! HTTP/1.1 transport adapter.
//!
//! [`WebHost`] binds a TCP listener and feeds every request to the
//! [`Pipeline`]. Concurrency is bounded by a semaphore of request permits; what
//! happens when it is saturated depends on [`OverloadPolicy`]. A permit is held
//! only while a request dispatches, so idle keep-alive connections never
//! starve active ones.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::{GracefulShutdown, Watcher};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, HostOptions, OverloadPolicy};
use crate::http::{HttpRequest, HttpResponse};
use crate::pipeline::Pipeline;
use crate::provider::ServiceProvider;

mod shutdown;
pub use shutdown::ShutdownToken;

/// Hosting errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("Invalid host configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Listener error: {0}")]
    Io(#[from] io::Error),
    #[error("Accept loop failed: {0}")]
    AcceptLoop(#[from] JoinError),
}

/// Listens for HTTP requests and dispatches them through the pipeline.
///
/// # Examples
///
/// ```no_run
/// use ferrous_host::{HostOptions, ServiceCollection, WebHost};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ServiceCollection::new().build();
/// let host = WebHost::new(provider, HostOptions::default().with_port(8080));
///
/// let running = host.start().await?;
/// tokio::signal::ctrl_c().await?;
/// running.shutdown();
/// running.join().await?;
/// # Ok(())
/// # }
/// ```
pub struct WebHost {
    pipeline: Arc<Pipeline>,
    options: HostOptions,
}

impl WebHost {
    pub fn new(provider: ServiceProvider, options: HostOptions) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::new(provider)),
            options,
        }
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    /// Binds the listener and spawns the accept loop.
    ///
    /// Returns as soon as the socket is bound; requests are served in the
    /// background until [`RunningHost::shutdown`] is called.
    pub async fn start(self) -> Result<RunningHost, HostError> {
        self.options.validate()?;
        let addr = self.options.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HostError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!(
            %local_addr,
            max_concurrent_requests = self.options.max_concurrent_requests,
            overload_policy = ?self.options.overload_policy,
            "host listening"
        );

        let shutdown = ShutdownToken::new();
        let dispatcher = Arc::new(Dispatcher {
            pipeline: self.pipeline,
            permits: Arc::new(Semaphore::new(self.options.max_concurrent_requests)),
            policy: self.options.overload_policy,
        });
        let accept_loop = AcceptLoop {
            listener,
            dispatcher,
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(accept_loop.run());

        Ok(RunningHost {
            local_addr,
            shutdown,
            task,
        })
    }
}

/// Handle to a started host.
pub struct RunningHost {
    local_addr: SocketAddr,
    shutdown: ShutdownToken,
    task: JoinHandle<()>,
}

impl RunningHost {
    /// The bound address, with the real port when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting new connections. In-flight requests keep running.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Waits for the accept loop to exit and every connection to drain.
    pub async fn join(self) -> Result<(), HostError> {
        self.task.await?;
        Ok(())
    }
}

struct AcceptLoop {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownToken,
}

impl AcceptLoop {
    async fn run(self) {
        let graceful = GracefulShutdown::new();
        let mut connections: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    reap(joined);
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!(error = %err, "accept failed");
                            continue;
                        }
                    };

                    debug!(%peer, "connection accepted");
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        self.dispatcher.clone(),
                        graceful.watcher(),
                    ));
                }
            }
        }

        info!(in_flight = connections.len(), "host stopping, draining connections");
        drop(self.listener);
        graceful.shutdown().await;
        while let Some(joined) = connections.join_next().await {
            reap(joined);
        }
        info!("host stopped");
    }
}

/// Shared by every connection: the pipeline and the request permits.
struct Dispatcher {
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
    policy: OverloadPolicy,
}

impl Dispatcher {
    /// A permit for one request, or `None` when the request must be refused.
    async fn admit(&self, peer: SocketAddr) -> Option<OwnedSemaphorePermit> {
        match self.policy {
            OverloadPolicy::Reject => match self.permits.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    warn!(%peer, "request limit reached, rejecting");
                    None
                }
            },
            OverloadPolicy::Wait => self.permits.clone().acquire_owned().await.ok(),
        }
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(join_err) = joined {
        if join_err.is_panic() {
            error!(error = %join_err, "connection task panicked");
        } else {
            error!(error = %join_err, "connection task error");
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    watcher: Watcher,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |request| handle_request(request, peer, dispatcher.clone()));
    let connection = http1::Builder::new().serve_connection(io, service);
    if let Err(err) = watcher.watch(connection).await {
        debug!(%peer, error = %err, "connection closed with error");
    }
}

async fn handle_request(
    request: Request<Incoming>,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(%peer, error = %err, "failed to read request body");
            return Ok(plain(StatusCode::BAD_REQUEST));
        }
    };

    // Held until dispatch finishes, released before the reply is written
    let Some(_permit) = dispatcher.admit(peer).await else {
        return Ok(plain(StatusCode::SERVICE_UNAVAILABLE));
    };

    let request = HttpRequest::from_parts(parts, body).with_peer(peer);
    let response = Arc::new(HttpResponse::new());
    let dispatch_response = response.clone();
    let pipeline = dispatcher.pipeline.clone();

    // Handlers are synchronous and may block
    let dispatched =
        tokio::task::spawn_blocking(move || pipeline.dispatch(request, dispatch_response)).await;
    if let Err(err) = dispatched {
        error!(%peer, error = %err, "dispatch task failed");
        return Ok(plain(StatusCode::INTERNAL_SERVER_ERROR));
    }

    let (status, headers, body) = response.to_parts();
    let mut reply = Response::new(Full::new(body));
    *reply.status_mut() = status;
    *reply.headers_mut() = headers;
    Ok(reply)
}

fn plain(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
