#![no_main]

use ferrous_host::{Construct, HttpRequest, HttpResponse, Pipeline, Service, ServiceCollection};
use http::{Method, StatusCode, Uri};
use libfuzzer_sys::fuzz_target;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counter(AtomicUsize);

impl Service for Counter {
    type Params = ();
    fn handle(&self, _: ()) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Echo;

impl Construct for Echo {
    type Deps = (Arc<Counter>,);
    fn construct(_: Self::Deps) -> anyhow::Result<Self> {
        Ok(Echo)
    }
}

impl Service for Echo {
    type Params = (Arc<HttpRequest>, Arc<HttpResponse>);
    fn handle(&self, (request, response): Self::Params) -> anyhow::Result<()> {
        response.write_str(request.raw_url())?;
        response.write(request.body())?;
        Ok(())
    }
}

struct Picky;

impl Construct for Picky {
    type Deps = ();
    fn construct(_: ()) -> anyhow::Result<Self> {
        Ok(Picky)
    }
}

impl Service for Picky {
    type Params = Arc<HttpRequest>;
    fn handle(&self, request: Arc<HttpRequest>) -> anyhow::Result<()> {
        match request.body().first() {
            Some(0xff) => anyhow::bail!("rejected body"),
            _ => Ok(()),
        }
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split = (data[0] as usize) % data.len();
    let (url, body) = data[1..].split_at(split.min(data.len() - 1));
    let uri = match std::str::from_utf8(url)
        .ok()
        .and_then(|u| format!("/{u}").parse::<Uri>().ok())
    {
        Some(uri) => uri,
        None => return,
    };

    let mut services = ServiceCollection::new();
    services
        .add_singleton::<Counter, Counter>()
        .add_scoped::<Echo, Echo>()
        .add_transient::<Picky, Picky>();
    let pipeline = Pipeline::new(services.build());

    let response = Arc::new(HttpResponse::new());
    let request = HttpRequest::new(Method::POST, uri).with_body(body.to_vec());
    let outcome = pipeline.dispatch(request, response.clone());

    assert!(response.is_closed());
    if outcome.is_success() {
        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.invoked.len(), 3);
    } else {
        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
    }
});
