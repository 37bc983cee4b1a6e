// onionware/src/transport.rs

//! The narrow transport contract consumed by terminal operations.
//!
//! The engine never talks to a transport. A terminal built with
//! [`transport_terminal`] does: it reads the request out of the context, hands
//! it to a [`Transport`] and writes the outcome back. Concrete adapters (HTTP
//! clients, streaming transports) live outside this crate and only need to
//! implement [`Transport::request`].

use crate::core::context_data::ContextData;
use crate::core::handler::{ChainFuture, Terminal};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{event, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
  #[default]
  Get,
  Post,
  Put,
  Delete,
  Patch,
  Head,
  Options,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Delete => "DELETE",
      Method::Patch => "PATCH",
      Method::Head => "HEAD",
      Method::Options => "OPTIONS",
    }
  }
}

impl std::fmt::Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How the adapter should treat the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
  #[default]
  Json,
  Text,
  Bytes,
  Stream,
}

/// Everything an adapter needs to perform one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
  pub method: Method,
  pub url: String,
  pub headers: BTreeMap<String, String>,
  /// Query parameters, appended to `url` by the adapter.
  pub params: BTreeMap<String, String>,
  pub body: Option<Vec<u8>>,
  pub timeout: Option<Duration>,
  pub response_type: ResponseType,
}

impl RequestConfig {
  pub fn new(method: Method, url: impl Into<String>) -> Self {
    Self {
      method,
      url: url.into(),
      ..Default::default()
    }
  }

  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.insert(name.into(), value.into());
    self
  }

  pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.params.insert(name.into(), value.into());
    self
  }

  pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = Some(body.into());
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn response_type(mut self, response_type: ResponseType) -> Self {
    self.response_type = response_type;
    self
  }
}

/// The outcome of one request, as reported by an adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData {
  pub data: Vec<u8>,
  pub status: u16,
  pub status_text: String,
  pub headers: BTreeMap<String, String>,
  /// The request that produced this response.
  pub config: RequestConfig,
}

impl ResponseData {
  /// `true` for 2xx statuses.
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Body decoded as UTF-8, replacing invalid sequences.
  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.data).into_owned()
  }
}

#[derive(Debug, Error)]
pub enum TransportError {
  #[error("Request to '{url}' timed out")]
  Timeout { url: String },

  #[error("Network error for '{url}': {message}")]
  Network { url: String, message: String },

  #[error("Request failed with status {status} {status_text}")]
  Status { status: u16, status_text: String },

  #[error("Transport error: {0}")]
  Other(#[from] anyhow::Error),
}

/// The single capability an adapter provides.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn request(&self, config: RequestConfig) -> Result<ResponseData, TransportError>;
}

/// A [`Transport`] backed by an async closure.
///
/// Handy for tests and for adapting an existing client without a new type.
pub struct FnTransport<F, Fut>
where
  F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<ResponseData, TransportError>> + Send + 'static,
{
  request_fn: F,
  _phantom_fut: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnTransport<F, Fut>
where
  F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<ResponseData, TransportError>> + Send + 'static,
{
  pub fn new(request_fn: F) -> Self {
    Self {
      request_fn,
      _phantom_fut: PhantomData,
    }
  }
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F, Fut>
where
  F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<ResponseData, TransportError>> + Send + 'static,
{
  async fn request(&self, config: RequestConfig) -> Result<ResponseData, TransportError> {
    (self.request_fn)(config).await
  }
}

/// Implemented by contexts that carry a single request/response exchange.
pub trait Exchange {
  /// The request to send. Handlers may have rewritten it on the way in.
  fn request_config(&self) -> RequestConfig;

  fn record_response(&mut self, response: ResponseData);

  fn record_error(&mut self, error: &TransportError);
}

/// Builds a terminal that performs the context's request through `transport`.
///
/// On success the response is recorded on the context. On failure the error is
/// recorded too, and then returned so the surrounding handlers see it from
/// `next.run().await`.
pub fn transport_terminal<C, E>(transport: Arc<dyn Transport>) -> Terminal<C, E>
where
  C: Exchange + Send + Sync + 'static,
  E: From<TransportError> + 'static,
{
  Arc::new(move |ctx_data: ContextData<C>| -> ChainFuture<E> {
    let transport = Arc::clone(&transport);
    Box::pin(async move {
      let config = ctx_data.read().request_config();
      event!(Level::DEBUG, method = %config.method, url = %config.url, "Sending request through transport.");

      match transport.request(config).await {
        Ok(response) => {
          event!(Level::DEBUG, status = response.status, "Transport responded.");
          ctx_data.write().record_response(response);
          Ok(())
        }
        Err(err) => {
          event!(Level::WARN, error = %err, "Transport request failed.");
          ctx_data.write().record_error(&err);
          Err(E::from(err))
        }
      }
    })
  })
}
