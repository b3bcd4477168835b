use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_host::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ===== Services =====

#[derive(Default)]
struct Counter(AtomicUsize);

impl Service for Counter {
    type Params = ();
    fn handle(&self, _: ()) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

struct PerRequest {
    counter: Arc<Counter>,
}

impl Construct for PerRequest {
    type Deps = (Arc<Counter>,);
    fn construct((counter,): Self::Deps) -> anyhow::Result<Self> {
        Ok(Self { counter })
    }
}

impl Service for PerRequest {
    type Params = (Arc<HttpRequest>, Arc<HttpResponse>);
    fn handle(&self, (request, response): Self::Params) -> anyhow::Result<()> {
        let seen = self.counter.0.load(Ordering::Relaxed);
        response.write_str(&format!("{} {}", seen, request.raw_url()))?;
        Ok(())
    }
}

struct Fresh;

impl Construct for Fresh {
    type Deps = (Arc<PerRequest>,);
    fn construct(_: Self::Deps) -> anyhow::Result<Self> {
        Ok(Fresh)
    }
}

impl Service for Fresh {
    type Params = Arc<PerRequest>;
    fn handle(&self, _: Arc<PerRequest>) -> anyhow::Result<()> {
        Ok(())
    }
}

trait Named: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Default)]
struct Impl;

impl Named for Impl {
    fn name(&self) -> &'static str {
        "impl"
    }
}

impl Service for Impl {
    type Params = ();
    fn handle(&self, _: ()) -> anyhow::Result<()> {
        Ok(())
    }
}

implements!(Impl => dyn Named);

struct Step<const N: usize>;

impl<const N: usize> Construct for Step<N> {
    type Deps = ();
    fn construct(_: ()) -> anyhow::Result<Self> {
        Ok(Step)
    }
}

impl<const N: usize> Service for Step<N> {
    type Params = ();
    fn handle(&self, _: ()) -> anyhow::Result<()> {
        Ok(())
    }
}

fn standard_provider() -> ServiceProvider {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<Counter, Counter>()
        .add_scoped::<PerRequest, PerRequest>()
        .add_transient::<Fresh, Fresh>();
    services.build()
}

// ===== Resolution =====

fn bench_singleton_hit(c: &mut Criterion) {
    let provider = standard_provider();
    let scope = provider.create_scope(HttpRequest::default());

    c.bench_function("singleton_hit", |b| {
        b.iter(|| {
            let v = scope.resolve::<Counter>().unwrap();
            black_box(v);
        })
    });
}

fn bench_scoped_vs_transient(c: &mut Criterion) {
    let provider = standard_provider();
    let scope = provider.create_scope(HttpRequest::default());
    // Prime the scoped slot
    let _ = scope.resolve::<PerRequest>().unwrap();

    let mut group = c.benchmark_group("lifetimes");
    group.bench_function("scoped_hit", |b| {
        b.iter(|| black_box(scope.resolve::<PerRequest>().unwrap()))
    });
    group.bench_function("transient_build", |b| {
        b.iter(|| black_box(scope.resolve::<Fresh>().unwrap()))
    });
    group.finish();
}

fn bench_concrete_vs_trait(c: &mut Criterion) {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<Impl, Impl>()
        .add_singleton::<dyn Named, Impl>();
    let provider = services.build();
    let scope = provider.create_scope(HttpRequest::default());

    let mut group = c.benchmark_group("interface");
    group.bench_function("concrete", |b| {
        b.iter(|| black_box(scope.resolve::<Impl>().unwrap()))
    });
    group.bench_function("trait_object", |b| {
        b.iter(|| black_box(scope.resolve::<dyn Named>().unwrap().name()))
    });
    group.finish();
}

// ===== Dispatch =====

fn bench_scope_lifecycle(c: &mut Criterion) {
    let provider = standard_provider();

    c.bench_function("scope_create_resolve_drop", |b| {
        b.iter(|| {
            let scope = provider.create_scope(HttpRequest::default());
            black_box(scope.resolve::<PerRequest>().unwrap());
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let pipeline = Pipeline::new(standard_provider());

    c.bench_function("dispatch_three_services", |b| {
        b.iter(|| {
            let response = Arc::new(HttpResponse::new());
            let outcome = pipeline.dispatch(HttpRequest::default(), response);
            black_box(outcome.status);
        })
    });
}

fn bench_dispatch_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_width");

    for width in [1usize, 4, 8] {
        let mut services = ServiceCollection::new();
        services.add_scoped::<Step<0>, Step<0>>();
        if width >= 4 {
            services
                .add_scoped::<Step<1>, Step<1>>()
                .add_scoped::<Step<2>, Step<2>>()
                .add_scoped::<Step<3>, Step<3>>();
        }
        if width >= 8 {
            services
                .add_transient::<Step<4>, Step<4>>()
                .add_transient::<Step<5>, Step<5>>()
                .add_transient::<Step<6>, Step<6>>()
                .add_transient::<Step<7>, Step<7>>();
        }
        let pipeline = Pipeline::new(services.build());

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let outcome =
                    pipeline.dispatch(HttpRequest::default(), Arc::new(HttpResponse::new()));
                black_box(outcome.invoked.len());
            })
        });
    }
    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let pipeline = Arc::new(Pipeline::new(standard_provider()));

    c.bench_function("dispatch_contention_4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let pipeline = pipeline.clone();
                    std::thread::spawn(move || {
                        for _ in 0..25 {
                            let response = Arc::new(HttpResponse::new());
                            black_box(pipeline.dispatch(HttpRequest::default(), response));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_scoped_vs_transient,
    bench_concrete_vs_trait,
    bench_scope_lifecycle,
    bench_dispatch,
    bench_dispatch_width,
    bench_contention,
);
criterion_main!(benches);
