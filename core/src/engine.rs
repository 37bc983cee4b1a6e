// onionware/src/engine.rs

//! Defines `Engine<C, E>`, the registry of globally registered handlers that
//! every dispatch wraps around its terminal operation.

use crate::chain::{compose_chain, compose::downcast_handler};
use crate::core::context_data::ContextData;
use crate::core::handler::{Handler, Terminal};
use crate::error::{ChainError, ChainResult};

use parking_lot::RwLock;
use std::any::Any;
use tracing::{event, instrument, Level};

/// Owns an ordered, append-only list of handlers and dispatches contexts through them.
///
/// An engine is an ordinary value: build one per client or session and share it
/// by reference (or `Arc`). Registration takes `&self`, so it may happen while
/// dispatches are in flight; each dispatch works on the snapshot it took when it
/// started and never sees later registrations.
pub struct Engine<C, E = ChainError>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  registry: RwLock<Vec<Handler<C, E>>>,
}

impl<C, E> Engine<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  /// Creates an engine with an empty registry.
  pub fn new() -> Self {
    Self {
      registry: RwLock::new(Vec::new()),
    }
  }

  /// Creates an engine whose registry is seeded with `handlers`, in order.
  pub fn with_handlers(handlers: impl IntoIterator<Item = Handler<C, E>>) -> Self {
    let engine = Self::new();
    engine.registry.write().extend(handlers);
    event!(Level::DEBUG, num_handlers = engine.len(), "Engine created with seed handlers.");
    engine
  }

  /// Appends `handler` to the registry. It runs after every handler registered before it.
  pub fn register(&self, handler: Handler<C, E>) {
    let mut registry = self.registry.write();
    registry.push(handler);
    event!(
      Level::DEBUG,
      context_type = %std::any::type_name::<C>(),
      position = registry.len() - 1,
      "Handler registered."
    );
  }

  /// Registers a handler arriving as an untyped value.
  ///
  /// Fails with `ChainError::InvalidArgument`, leaving the registry untouched,
  /// when `handler` is not a [`Handler<C, E>`].
  pub fn register_erased(&self, handler: Box<dyn Any + Send + Sync>) -> ChainResult<()> {
    let handler = downcast_handler::<C, E>(handler, "registered value")?;
    self.register(handler);
    Ok(())
  }

  /// Returns a copy of the registered handlers, in registration order.
  pub fn list_registered(&self) -> Vec<Handler<C, E>> {
    self.registry.read().clone()
  }

  pub fn len(&self) -> usize {
    self.registry.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.registry.read().is_empty()
  }

  /// Runs `ctx_data` through the registered handlers, then `extra` handlers,
  /// then `terminal`.
  ///
  /// `extra` applies to this call only and is never stored. Errors from
  /// handlers or the terminal come back unchanged.
  #[instrument(
        name = "Engine::dispatch",
        skip_all,
        fields(
            context_type = %std::any::type_name::<C>(),
            num_extra = extra.len(),
            has_terminal = terminal.is_some(),
        ),
        err(Display)
    )]
  pub async fn dispatch(
    &self,
    ctx_data: ContextData<C>,
    terminal: Option<Terminal<C, E>>,
    extra: &[Handler<C, E>],
  ) -> Result<(), E> {
    // Read the registry exactly once; the lock is released before anything runs.
    let mut effective = self.list_registered();
    let num_registered = effective.len();
    effective.extend_from_slice(extra);
    event!(Level::DEBUG, num_registered, num_effective = effective.len(), "Dispatching through chain.");

    compose_chain(effective, terminal).run(ctx_data).await
  }
}

impl<C, E> Default for Engine<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<C, E> std::fmt::Debug for Engine<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Engine")
      .field("context_type", &std::any::type_name::<C>())
      .field("num_registered", &self.len())
      .finish()
  }
}
