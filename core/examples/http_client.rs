// onionware/examples/http_client.rs

//! Wires an engine to a (mock) transport, the way a client layer would.

use onionware::{
  handler, transport_terminal, ContextData, Engine, Exchange, FnTransport, Method, Next, RequestConfig, ResponseData,
  Transport, TransportError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum ClientError {
  #[error(transparent)]
  Chain(#[from] onionware::ChainError),
  #[error(transparent)]
  Transport(#[from] TransportError),
}

#[derive(Debug, Default)]
struct HttpExchange {
  request: RequestConfig,
  response: Option<ResponseData>,
  error: Option<String>,
}

impl Exchange for HttpExchange {
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

type HttpNext = Next<HttpExchange, ClientError>;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

  let transport: Arc<dyn Transport> = Arc::new(FnTransport::new(|config: RequestConfig| async move {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    Ok::<_, TransportError>(ResponseData {
      data: br#"{"ok":true}"#.to_vec(),
      status: 200,
      status_text: "OK".to_string(),
      headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
      config,
    })
  }));

  let engine = Engine::<HttpExchange, ClientError>::new();

  // Timing: wraps everything else.
  engine.register(handler(|ctx: ContextData<HttpExchange>, next: HttpNext| async move {
    let started = Instant::now();
    let outcome = next.run().await;
    let status = ctx.read().response.as_ref().map(|r| r.status);
    info!(elapsed_ms = started.elapsed().as_millis() as u64, ?status, "request finished");
    outcome
  }));

  // Auth: decorates the request on the way in.
  engine.register(handler(|ctx: ContextData<HttpExchange>, next: HttpNext| async move {
    ctx
      .write()
      .request
      .headers
      .insert("authorization".to_string(), "Bearer demo".to_string());
    next.run().await
  }));

  let ctx = ContextData::new(HttpExchange {
    request: RequestConfig::new(Method::Get, "https://example.invalid/status").param("verbose", "1"),
    ..Default::default()
  });
  engine
    .dispatch(ctx.clone(), Some(transport_terminal(transport)), &[])
    .await?;

  let guard = ctx.read();
  if let Some(response) = &guard.response {
    info!(status = response.status, body = %response.text(), "response");
  }
  Ok(())
}
