use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use onionware::{compose_chain, handler, terminal, ChainError, ContextData, Engine, Handler, Next, Terminal};
use std::sync::Arc;
use tokio::runtime::Runtime; // To run async code within Criterion

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

// Using ChainError directly for benchmark simplicity.
type BenchError = ChainError;

// --- Helper: handler doing CPU work on both sides of `next` ---
fn create_sync_wrapping_handler(iterations: u64) -> Handler<BenchContext, BenchError> {
  handler(move |ctx: ContextData<BenchContext>, next: Next<BenchContext, BenchError>| async move {
    {
      let mut data = ctx.write();
      for _ in 0..iterations {
        data.counter = data.counter.wrapping_add(1);
      }
    }
    next.run().await?;
    ctx.write().counter += 1;
    Ok::<(), BenchError>(())
  })
}

// --- Helper: handler awaiting a timer before `next` ---
fn create_async_io_handler(delay_micros: u64) -> Handler<BenchContext, BenchError> {
  handler(move |ctx: ContextData<BenchContext>, next: Next<BenchContext, BenchError>| async move {
    if delay_micros > 0 {
      tokio::time::sleep(std::time::Duration::from_micros(delay_micros)).await;
    }
    next.run().await?;
    ctx.write().counter += 1;
    Ok::<(), BenchError>(())
  })
}

fn noop_terminal() -> Terminal<BenchContext, BenchError> {
  terminal(|ctx: ContextData<BenchContext>| async move {
    ctx.write().counter += 1;
    Ok::<(), BenchError>(())
  })
}

// --- Benchmark Functions ---

fn bench_chain_depth_sync_handlers(c: &mut Criterion) {
  let mut group = c.benchmark_group("ChainDepthSync");
  let rt = Runtime::new().unwrap();

  for depth in [1usize, 5, 10, 50].iter() {
    for handler_iterations in [1u64, 100].iter() {
      let handlers: Vec<_> = (0..*depth)
        .map(|_| create_sync_wrapping_handler(*handler_iterations))
        .collect();
      let chain = Arc::new(compose_chain(handlers, Some(noop_terminal())));

      group.throughput(Throughput::Elements(*depth as u64));
      group.bench_with_input(
        BenchmarkId::new(format!("{}deep_{}iter", depth, handler_iterations), depth),
        depth,
        |b, _| {
          b.to_async(&rt).iter_batched(
            || ContextData::new(BenchContext::default()),
            |ctx| {
              let chain = chain.clone();
              async move { chain.run(ctx).await.unwrap() }
            },
            criterion::BatchSize::SmallInput,
          );
        },
      );
    }
  }
  group.finish();
}

fn bench_chain_async_handlers(c: &mut Criterion) {
  let mut group = c.benchmark_group("ChainAsyncIO");
  let rt = Runtime::new().unwrap();

  for depth in [1usize, 5].iter() {
    for delay_us in [0u64, 10].iter() {
      let handlers: Vec<_> = (0..*depth).map(|_| create_async_io_handler(*delay_us)).collect();
      let chain = Arc::new(compose_chain(handlers, Some(noop_terminal())));

      group.throughput(Throughput::Elements(*depth as u64));
      group.bench_with_input(
        BenchmarkId::new(format!("{}deep_{}us_delay", depth, delay_us), *delay_us),
        delay_us,
        |b, _| {
          b.to_async(&rt).iter_batched(
            || ContextData::new(BenchContext::default()),
            |ctx| {
              let chain = chain.clone();
              async move { chain.run(ctx).await.unwrap() }
            },
            criterion::BatchSize::SmallInput,
          );
        },
      );
    }
  }
  group.finish();
}

fn bench_engine_dispatch_overhead(c: &mut Criterion) {
  let mut group = c.benchmark_group("EngineDispatchOverhead");
  let rt = Runtime::new().unwrap();

  for registered in [0usize, 5, 20].iter() {
    let engine = Arc::new(Engine::with_handlers(
      (0..*registered).map(|_| create_sync_wrapping_handler(1)),
    ));
    let extra = vec![create_sync_wrapping_handler(1)];

    group.bench_with_input(BenchmarkId::new("registered", registered), registered, |b, _| {
      b.to_async(&rt).iter_batched(
        || ContextData::new(BenchContext::default()),
        |ctx| {
          let engine = engine.clone();
          let extra = extra.clone();
          async move { engine.dispatch(ctx, Some(noop_terminal()), &extra).await.unwrap() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_context_data_access(c: &mut Criterion) {
  let mut group = c.benchmark_group("ContextDataAccess");
  let ctx = ContextData::new(BenchContext::default());

  group.bench_function("read_lock", |b| {
    b.iter(|| {
      let guard = ctx.read();
      criterion::black_box(guard.counter);
    })
  });

  group.bench_function("write_lock_and_modify", |b| {
    b.iter(|| {
      let mut guard = ctx.write();
      guard.counter += 1;
      criterion::black_box(guard.counter);
    })
  });
  group.finish();
}

criterion_group!(
  benches,
  bench_chain_depth_sync_handlers,
  bench_chain_async_handlers,
  bench_engine_dispatch_overhead,
  bench_context_data_access
);
criterion_main!(benches);
