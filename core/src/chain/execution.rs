// onionware/src/chain/execution.rs

//! Per-run execution state and the continuation handle handed to each handler.

use crate::core::context_data::WeakContextData;
use crate::core::handler::{ChainFuture, Handler, Terminal};
use crate::error::ChainError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{event, Level};

/// State for one run of a composed chain. Created by `Chain::run`, dropped when it settles.
pub(crate) struct Execution<C: Send + Sync + 'static, E> {
  pub(crate) handlers: Arc<[Handler<C, E>]>,
  pub(crate) terminal: Option<Terminal<C, E>>,
  // Weak so a `Next` stashed inside the context cannot keep the context alive.
  pub(crate) ctx_data: WeakContextData<C>,
  // Highest position advanced to so far. `None` until `advance(0)`.
  pub(crate) highest: Mutex<Option<usize>>,
}

impl<C, E> Execution<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  pub(crate) fn new(handlers: Arc<[Handler<C, E>]>, terminal: Option<Terminal<C, E>>, ctx_data: WeakContextData<C>) -> Self {
    Self {
      handlers,
      terminal,
      ctx_data,
      highest: Mutex::new(None),
    }
  }

  /// Claims `position` for this execution. Positions must strictly increase.
  fn claim(&self, position: usize) -> Result<(), ChainError> {
    let mut highest = self.highest.lock();
    if let Some(current) = *highest {
      if position <= current {
        return Err(ChainError::ProtocolViolation { position });
      }
    }
    *highest = Some(position);
    Ok(())
  }

  /// Runs the handler at `position` (or the terminal once the handlers are exhausted).
  pub(crate) fn advance(self: Arc<Self>, position: usize) -> ChainFuture<E> {
    Box::pin(async move {
      if let Err(violation) = self.claim(position) {
        event!(Level::ERROR, position, "Continuation invoked more than once or out of order.");
        return Err(E::from(violation));
      }

      // Only a continuation that outlived its dispatch and every context handle gets here.
      let Some(ctx_data) = self.ctx_data.upgrade() else {
        event!(Level::DEBUG, position, "Context already dropped, nothing left to run.");
        return Ok(());
      };

      let Some(handler_fn) = self.handlers.get(position).cloned() else {
        // Past the last handler: only the exact end runs the terminal.
        if position != self.handlers.len() {
          return Ok(());
        }
        return match &self.terminal {
          Some(terminal_fn) => {
            event!(Level::TRACE, "Running terminal operation.");
            terminal_fn(ctx_data).await.map_err(|e| {
              event!(Level::DEBUG, error = %e, "Terminal operation failed.");
              e
            })
          }
          None => {
            event!(Level::TRACE, "Chain exhausted without a terminal operation.");
            Ok(())
          }
        };
      };

      event!(Level::TRACE, position, "Entering handler.");
      let next = Next {
        execution: Arc::clone(&self),
        position: position + 1,
      };
      handler_fn(ctx_data, next).await
    })
  }
}

/// The continuation handed to a handler: "run everything after me".
///
/// Calling [`Next::run`] a second time, or calling a continuation that belongs
/// to an already-passed position, fails with `ChainError::ProtocolViolation`
/// (converted into the chain's error type) without running anything downstream
/// again. Dropping `Next` without running it ends the chain at that handler.
///
/// `Next` holds the context only weakly, so a handler may store it inside the
/// context without leaking it. Once the dispatch has settled and every
/// `ContextData` handle is gone, running such a stored continuation is a no-op.
pub struct Next<C: Send + Sync + 'static, E> {
  execution: Arc<Execution<C, E>>,
  position: usize,
}

impl<C, E> Next<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<ChainError> + Send + Sync + 'static,
{
  /// Advances the chain. Resolves once every later handler (and the terminal) has finished.
  pub fn run(&self) -> ChainFuture<E> {
    Arc::clone(&self.execution).advance(self.position)
  }

  /// Position this continuation advances to. Equals the handler count when it leads to the terminal.
  pub fn position(&self) -> usize {
    self.position
  }
}

impl<C: Send + Sync + 'static, E> Clone for Next<C, E> {
  fn clone(&self) -> Self {
    Self {
      execution: Arc::clone(&self.execution),
      position: self.position,
    }
  }
}

impl<C: Send + Sync + 'static, E> std::fmt::Debug for Next<C, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Next")
      .field("position", &self.position)
      .field("chain_len", &self.execution.handlers.len())
      .finish()
  }
}
