// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use onionware::{
  handler, terminal, ChainError, ContextData, Exchange, Handler, Next, RequestConfig, ResponseData, Terminal,
  TransportError,
};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Context Structs ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub log: Vec<String>,
  pub counter: i32,
}

impl TestContext {
  pub fn push(&mut self, entry: impl Into<String>) {
    self.log.push(entry.into());
  }
}

/// Context carrying one request/response exchange, for transport tests.
#[derive(Clone, Debug, Default)]
pub struct ExchangeContext {
  pub request: RequestConfig,
  pub response: Option<ResponseData>,
  pub error: Option<String>,
  pub log: Vec<String>,
}

impl Exchange for ExchangeContext {
  fn request_config(&self) -> RequestConfig {
    self.request.clone()
  }

  fn record_response(&mut self, response: ResponseData) {
    self.response = Some(response);
  }

  fn record_error(&mut self, error: &TransportError) {
    self.error = Some(error.to_string());
  }
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)] // Clone, PartialEq, Eq for assertions
pub enum TestError {
  #[error("Chain framework error: {0}")]
  Chain(String), // Debug string of the ChainError, for Eq comparison

  #[error("Test handler failed: {0}")]
  Handler(String),

  #[error("Test terminal failed: {0}")]
  Terminal(String),

  #[error("Test transport failed: {0}")]
  Transport(String),
}

impl From<ChainError> for TestError {
  fn from(ce: ChainError) -> Self {
    TestError::Chain(format!("{:?}", ce))
  }
}

impl From<TransportError> for TestError {
  fn from(te: TransportError) -> Self {
    TestError::Transport(te.to_string())
  }
}

pub type TestHandler = Handler<TestContext, TestError>;
pub type TestNext = Next<TestContext, TestError>;

// --- Common Handler Creators ---

/// Logs `<name>-before`, runs the rest of the chain, then logs `<name>-after`.
pub fn logging_handler(name: &'static str) -> TestHandler {
  handler(move |ctx: ContextData<TestContext>, next: TestNext| async move {
    ctx.write().push(format!("{}-before", name));
    next.run().await?;
    ctx.write().push(format!("{}-after", name));
    Ok::<(), TestError>(())
  })
}

/// Logs `<name>` and ends the chain without calling `next`.
pub fn stopping_handler(name: &'static str) -> TestHandler {
  handler(move |ctx: ContextData<TestContext>, _next: TestNext| async move {
    ctx.write().push(name);
    Ok::<(), TestError>(())
  })
}

/// Logs `<name>` and fails before calling `next`.
pub fn failing_handler(name: &'static str, error_message: &'static str) -> TestHandler {
  handler(move |ctx: ContextData<TestContext>, _next: TestNext| async move {
    ctx.write().push(name);
    tracing::warn!(target: "test_handlers", handler = name, "failing with: '{}'", error_message);
    Err::<(), TestError>(TestError::Handler(error_message.to_string()))
  })
}

/// Logs `terminal` and bumps `TERMINAL_EXEC_COUNTER`.
pub fn recording_terminal() -> Terminal<TestContext, TestError> {
  terminal(|ctx: ContextData<TestContext>| async move {
    TERMINAL_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    ctx.write().push("terminal");
    Ok::<(), TestError>(())
  })
}

pub fn failing_terminal(error_message: &'static str) -> Terminal<TestContext, TestError> {
  terminal(move |ctx: ContextData<TestContext>| async move {
    TERMINAL_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    ctx.write().push("terminal");
    Err::<(), TestError>(TestError::Terminal(error_message.to_string()))
  })
}

pub fn log_of(ctx: &ContextData<TestContext>) -> Vec<String> {
  ctx.read().log.clone()
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::TRACE)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static TERMINAL_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static TRANSPORT_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  TERMINAL_EXEC_COUNTER.store(0, Ordering::SeqCst);
  TRANSPORT_EXEC_COUNTER.store(0, Ordering::SeqCst);
}

pub fn terminal_runs() -> usize {
  TERMINAL_EXEC_COUNTER.load(Ordering::SeqCst)
}
