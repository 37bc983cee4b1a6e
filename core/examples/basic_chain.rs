// onionware/examples/basic_chain.rs

use onionware::{handler, terminal, ChainError, ContextData, Engine, Next};
use tracing::info;

// 1. Define the Context Data threaded through the chain
#[derive(Clone, Debug, Default)]
struct BasicContext {
  message_log: Vec<String>,
  counter: i32,
}

type BasicNext = Next<BasicContext, ChainError>;

#[tokio::main]
async fn main() -> Result<(), ChainError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Chain Example ---");

  // 2. Create an engine. ChainError is the default error type.
  let engine: Engine<BasicContext> = Engine::new();

  // 3. Register global handlers. Each one wraps everything registered after it.
  engine.register(handler(|ctx: ContextData<BasicContext>, next: BasicNext| async move {
    ctx.write().message_log.push("outer: before".to_string());
    next.run().await?;
    ctx.write().message_log.push("outer: after".to_string());
    Ok::<_, ChainError>(())
  }));

  engine.register(handler(|ctx: ContextData<BasicContext>, next: BasicNext| async move {
    {
      let mut data = ctx.write();
      data.counter += 1;
      let counter = data.counter;
      data.message_log.push(format!("inner: before, counter = {}", counter));
    } // guard dropped before awaiting the rest of the chain
    next.run().await?;
    let mut data = ctx.write();
    data.counter *= 2;
    let counter = data.counter;
    data.message_log.push(format!("inner: after, counter = {}", counter));
    Ok::<_, ChainError>(())
  }));

  // 4. A per-call extra handler and the terminal operation
  let audit = handler(|ctx: ContextData<BasicContext>, next: BasicNext| async move {
    ctx.write().message_log.push("audit (this call only)".to_string());
    next.run().await
  });
  let work = terminal(|ctx: ContextData<BasicContext>| async move {
    let mut data = ctx.write();
    data.counter += 10;
    let counter = data.counter;
    data.message_log.push(format!("terminal: counter = {}", counter));
    Ok::<_, ChainError>(())
  });

  // 5. Dispatch
  let ctx = ContextData::new(BasicContext {
    counter: 5,
    ..Default::default()
  });
  engine.dispatch(ctx.clone(), Some(work), &[audit]).await?;

  // 6. Inspect the results
  let final_state = ctx.read();
  info!("Final counter value: {}", final_state.counter);
  for entry in &final_state.message_log {
    info!("- {}", entry);
  }

  // Expected: ((5 + 1) + 10) * 2 = 32
  assert_eq!(final_state.counter, 32);
  assert_eq!(final_state.message_log.len(), 6);

  Ok(())
}
