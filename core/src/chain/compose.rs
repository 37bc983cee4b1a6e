// onionware/src/chain/compose.rs

//! Contains the `Chain<C, E>` type and the functions that build it from a
//! handler sequence plus an optional terminal operation.

use crate::chain::execution::Execution;
use crate::core::context_data::ContextData;
use crate::core::handler::{Handler, Terminal};
use crate::error::{ChainError, ChainResult};
use std::any::Any;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// A composed, reusable chain: a fixed handler sequence wrapped around an optional terminal.
///
/// Each call to [`Chain::run`] is an independent execution with its own
/// continuation guard, so one chain may be run many times, concurrently or not.
pub struct Chain<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  handlers: Arc<[Handler<C, E>]>,
  terminal: Option<Terminal<C, E>>,
}

/// Composes `handlers` around `terminal`.
///
/// The handlers are copied into the chain; the caller's sequence is never
/// touched again. Handler types are checked statically, so this cannot fail.
/// See [`compose_erased`] for lists assembled from untyped values.
pub fn compose_chain<C, E>(
  handlers: impl IntoIterator<Item = Handler<C, E>>,
  terminal: Option<Terminal<C, E>>,
) -> Chain<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  let handlers: Arc<[Handler<C, E>]> = handlers.into_iter().collect();
  event!(
    Level::TRACE,
    num_handlers = handlers.len(),
    has_terminal = terminal.is_some(),
    "Composing chain."
  );
  Chain { handlers, terminal }
}

/// Composes a chain from a type-erased handler list.
///
/// `handlers` must hold either a `Vec<Handler<C, E>>` or a
/// `Vec<Box<dyn Any + Send + Sync>>` whose every element is a [`Handler<C, E>`].
/// Anything else fails with `ChainError::InvalidArgument` before any handler
/// could run.
pub fn compose_erased<C, E>(handlers: Box<dyn Any + Send>, terminal: Option<Terminal<C, E>>) -> ChainResult<Chain<C, E>>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  let handlers = match handlers.downcast::<Vec<Handler<C, E>>>() {
    Ok(typed) => return Ok(compose_chain(*typed, terminal)),
    Err(other) => other,
  };

  let items = handlers.downcast::<Vec<Box<dyn Any + Send + Sync>>>().map_err(|_| {
    event!(Level::ERROR, "Erased handler list is not a sequence.");
    ChainError::invalid_argument("handlers must be a sequence (Vec<Handler> or Vec<Box<dyn Any + Send + Sync>>)")
  })?;

  let typed = items
    .into_iter()
    .enumerate()
    .map(|(idx, item)| downcast_handler::<C, E>(item, &format!("element at position {}", idx)))
    .collect::<ChainResult<Vec<_>>>()?;

  Ok(compose_chain(typed, terminal))
}

/// Recovers a `Handler<C, E>` from an erased value, naming `what` in the error.
pub(crate) fn downcast_handler<C, E>(item: Box<dyn Any + Send + Sync>, what: &str) -> ChainResult<Handler<C, E>>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  match item.downcast::<Handler<C, E>>() {
    Ok(boxed) => Ok(*boxed),
    Err(_) => {
      event!(Level::ERROR, %what, "Erased value is not a handler.");
      Err(ChainError::invalid_argument(format!(
        "{} is not a callable Handler<{}, {}>",
        what,
        std::any::type_name::<C>(),
        std::any::type_name::<E>()
      )))
    }
  }
}

impl<C, E> Chain<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  /// Executes the chain once against `ctx_data`.
  ///
  /// Resolves when the outermost handler returns. Fails with the first error
  /// raised by a handler or the terminal (unchanged), or with
  /// `ChainError::ProtocolViolation` converted into `E` when a continuation is misused.
  #[instrument(
        name = "Chain::run",
        skip_all,
        fields(
            context_type = %std::any::type_name::<C>(),
            num_handlers = self.handlers.len(),
            has_terminal = self.terminal.is_some(),
        ),
        err(Display)
    )]
  pub async fn run(&self, ctx_data: ContextData<C>) -> Result<(), E> {
    // `ctx_data` stays owned here until the run settles; the execution only holds it weakly.
    let execution = Arc::new(Execution::new(
      self.handlers.clone(),
      self.terminal.clone(),
      ctx_data.downgrade(),
    ));
    let result = execution.advance(0).await;
    drop(ctx_data);
    result
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }

  pub fn has_terminal(&self) -> bool {
    self.terminal.is_some()
  }
}

impl<C, E> Clone for Chain<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  fn clone(&self) -> Self {
    Self {
      handlers: Arc::clone(&self.handlers),
      terminal: self.terminal.clone(),
    }
  }
}

// Handlers are closures, so only their count is printed.
impl<C, E> std::fmt::Debug for Chain<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Chain")
      .field("num_handlers", &self.handlers.len())
      .field("has_terminal", &self.terminal.is_some())
      .finish()
  }
}
