// onionware/examples/error_handling.rs

use onionware::{compose_chain, handler, ChainError, ContextData, Next};
use tracing::{error, info};

// 1. Define a custom application error type
#[derive(Debug, thiserror::Error)]
enum ExampleAppError {
  #[error("A custom application error occurred: {0}")]
  CustomError(String),

  #[error("Chain framework error: {0}")]
  Chain(#[from] ChainError), // Lets the engine report misuse through this type
}

#[derive(Clone, Debug, Default)]
struct ErrorContext {
  visited: Vec<String>,
}

type ErrorNext = Next<ErrorContext, ExampleAppError>;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Error Handling Example ---");

  info!("\nScenario 1: Handler fails before calling next");
  handler_error().await;

  info!("\nScenario 2: Handler calls next twice");
  protocol_violation().await;
}

async fn handler_error() {
  let chain = compose_chain(
    vec![
      handler(|ctx: ContextData<ErrorContext>, next: ErrorNext| async move {
        ctx.write().visited.push("logger".to_string());
        next.run().await
      }),
      handler(|ctx: ContextData<ErrorContext>, _next: ErrorNext| async move {
        ctx.write().visited.push("auth".to_string());
        Err::<(), _>(ExampleAppError::CustomError("missing credentials".to_string()))
      }),
    ],
    None,
  );

  let ctx = ContextData::new(ErrorContext::default());
  match chain.run(ctx.clone()).await {
    Ok(()) => info!("Chain completed unexpectedly."),
    Err(e) => error!("Chain failed as expected: {}", e),
  }
  info!("Visited: {:?}", ctx.read().visited);
}

async fn protocol_violation() {
  let chain = compose_chain(
    vec![handler(|_ctx: ContextData<ErrorContext>, next: ErrorNext| async move {
      next.run().await?;
      next.run().await // second call is rejected
    })],
    None,
  );

  match chain.run(ContextData::new(ErrorContext::default())).await {
    Err(ExampleAppError::Chain(e)) if e.is_protocol_violation() => info!("Misuse detected: {}", e),
    other => error!("Unexpected outcome: {:?}", other),
  }
}
