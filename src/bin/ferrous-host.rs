//! Demo host: one singleton, one scoped and one transient service, each
//! counting how often it runs.
//!
//! ```text
//! FERROUS_HOST_PORT=8080 RUST_LOG=debug cargo run
//! curl http://localhost:8080/anything
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ferrous_host::{
    implements, Construct, HostOptions, HttpRequest, HttpResponse, Service, ServiceCollection,
    TracingObserver, WebHost,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

trait Greeter: Send + Sync {
    fn bump(&self) -> usize;
}

trait RequestTally: Send + Sync {
    fn bump(&self) -> usize;
}

trait Probe: Send + Sync {
    fn bump(&self) -> usize;
}

/// Answers every request and counts them for the life of the process.
#[derive(Default)]
struct HelloGreeter {
    counter: AtomicUsize,
}

impl Greeter for HelloGreeter {
    fn bump(&self) -> usize {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "singleton");
        count
    }
}

impl Service for HelloGreeter {
    type Params = (Arc<HttpRequest>, Arc<HttpResponse>);

    fn handle(&self, (request, response): Self::Params) -> anyhow::Result<()> {
        response.write_str(&format!("Hello from Test, request URL: {}", request.raw_url()))?;
        self.bump();
        Ok(())
    }
}

implements!(HelloGreeter => dyn Greeter);

/// Fresh for every request, so it never counts past one.
#[derive(Default)]
struct ScopedTally {
    counter: AtomicUsize,
}

impl RequestTally for ScopedTally {
    fn bump(&self) -> usize {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "scoped");
        count
    }
}

impl Construct for ScopedTally {
    type Deps = ();

    fn construct(_: ()) -> anyhow::Result<Self> {
        Ok(Self::default())
    }
}

impl Service for ScopedTally {
    type Params = Arc<dyn Greeter>;

    fn handle(&self, greeter: Arc<dyn Greeter>) -> anyhow::Result<()> {
        greeter.bump();
        self.bump();
        Ok(())
    }
}

implements!(ScopedTally => dyn RequestTally);

/// Fresh on every resolution.
#[derive(Default)]
struct TransientProbe {
    counter: AtomicUsize,
}

impl Probe for TransientProbe {
    fn bump(&self) -> usize {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "transient");
        count
    }
}

impl Construct for TransientProbe {
    type Deps = ();

    fn construct(_: ()) -> anyhow::Result<Self> {
        Ok(Self::default())
    }
}

impl Service for TransientProbe {
    type Params = Arc<dyn RequestTally>;

    fn handle(&self, tally: Arc<dyn RequestTally>) -> anyhow::Result<()> {
        tally.bump();
        self.bump();
        Ok(())
    }
}

implements!(TransientProbe => dyn Probe);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut services = ServiceCollection::new();
    services
        .add_singleton::<dyn Greeter, HelloGreeter>()
        .add_scoped::<dyn RequestTally, ScopedTally>()
        .add_transient::<dyn Probe, TransientProbe>()
        .add_observer(Arc::new(TracingObserver));
    let provider = services.build_validated()?;

    let options = HostOptions::from_env()?;
    let running = WebHost::new(provider, options).start().await?;
    info!(addr = %running.local_addr(), "press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    running.shutdown();
    running.join().await?;
    Ok(())
}
