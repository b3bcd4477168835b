/// Concurrent access integration tests
///
/// These tests verify that dispatch behaves correctly when many requests run
/// at once: singleton consistency, scope isolation, and failure isolation.

use ferrous_host::{
    Construct, HttpRequest, HttpResponse, Pipeline, Service, ServiceCollection,
};
use http::StatusCode;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

// ===== Test Services =====

#[derive(Default)]
pub struct CounterService {
    count: AtomicU32,
}

impl CounterService {
    pub fn get_count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

impl Service for CounterService {
    type Params = ();
    fn handle(&self, _: ()) -> anyhow::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct RequestLocal {
    id: u32,
    _counter: Arc<CounterService>,
}

impl Construct for RequestLocal {
    type Deps = (Arc<CounterService>,);
    fn construct((counter,): Self::Deps) -> anyhow::Result<Self> {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Ok(Self {
            id: NEXT.fetch_add(1, Ordering::SeqCst),
            _counter: counter,
        })
    }
}

impl Service for RequestLocal {
    type Params = (Arc<RequestLocal>, Arc<HttpResponse>);
    fn handle(&self, (again, response): Self::Params) -> anyhow::Result<()> {
        // The parameter is this request's scoped instance, i.e. self
        anyhow::ensure!(again.id == self.id, "scoped instance changed within request");
        response.write_str(&self.id.to_string())?;
        Ok(())
    }
}

/// Fails every request whose URL asks for it.
#[derive(Default)]
pub struct Tripwire;

impl Service for Tripwire {
    type Params = Arc<HttpRequest>;
    fn handle(&self, request: Arc<HttpRequest>) -> anyhow::Result<()> {
        if request.raw_url().contains("fail") {
            anyhow::bail!("tripped by {}", request.raw_url());
        }
        Ok(())
    }
}

// ===== Integration Tests =====

#[test]
fn test_concurrent_dispatch_shares_singletons_and_isolates_scopes() {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<CounterService, CounterService>()
        .add_scoped::<RequestLocal, RequestLocal>();

    let pipeline = Arc::new(Pipeline::new(services.build()));
    let thread_count = 8;
    let requests_per_thread = 50;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait(); // Synchronize start
                let mut ids = Vec::with_capacity(requests_per_thread);
                for _ in 0..requests_per_thread {
                    let response = Arc::new(HttpResponse::new());
                    let outcome = pipeline.dispatch(HttpRequest::default(), response.clone());
                    assert!(outcome.is_success(), "{:?}", outcome.error);
                    let body = String::from_utf8(response.body().to_vec()).unwrap();
                    ids.push(body.parse::<u32>().unwrap());
                }
                ids
            })
        })
        .collect();

    let mut ids: Vec<u32> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    // Every request incremented the one shared counter
    let counter = pipeline.provider().get_singleton::<CounterService>().unwrap();
    assert_eq!(counter.get_count(), (thread_count * requests_per_thread) as u32);

    // Every request got its own scoped instance
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn test_failures_stay_with_their_request() {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<Tripwire, Tripwire>()
        .add_singleton::<CounterService, CounterService>();

    let pipeline = Arc::new(Pipeline::new(services.build()));
    let thread_count = 6;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|thread_id| {
            let pipeline = Arc::clone(&pipeline);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                let mut statuses = Vec::new();
                for i in 0..20 {
                    let url = if (thread_id + i) % 2 == 0 { "/fail" } else { "/ok" };
                    let request = HttpRequest::new(http::Method::GET, url.parse().unwrap());
                    let response = Arc::new(HttpResponse::new());
                    let outcome = pipeline.dispatch(request, response);
                    statuses.push((url, outcome.status));
                }
                statuses
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        for (url, status) in handle.join().unwrap() {
            if url == "/fail" {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            } else {
                assert_eq!(status, StatusCode::OK);
                succeeded += 1;
            }
        }
    }

    // The counter after the tripwire only ran for successful requests
    let counter = pipeline.provider().get_singleton::<CounterService>().unwrap();
    assert_eq!(counter.get_count(), succeeded);
}
