// onionware/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the chain machinery itself.
///
/// Errors produced by handlers or by the terminal operation are never wrapped in
/// this type by the engine; they travel through the chain with their identity intact.
#[derive(Debug, Error)]
pub enum ChainError {
  /// Malformed input at one of the untyped entry points
  /// (`compose_erased`, `Engine::register_erased`).
  #[error("Invalid argument: {reason}")]
  InvalidArgument { reason: String },

  /// A continuation was invoked twice, or after a later position had already run.
  #[error("Continuation invoked multiple times (position {position})")]
  ProtocolViolation { position: usize },

  /// Lets applications that use `ChainError` as their pipeline error write
  /// `anyhow`-returning handlers. Never produced by the engine.
  #[error("Error in user-provided handler or external operation. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },
}

impl ChainError {
  pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
    ChainError::InvalidArgument { reason: reason.into() }
  }

  /// `true` for `ProtocolViolation`.
  pub fn is_protocol_violation(&self) -> bool {
    matches!(self, ChainError::ProtocolViolation { .. })
  }

  /// `true` for `InvalidArgument`.
  pub fn is_invalid_argument(&self) -> bool {
    matches!(self, ChainError::InvalidArgument { .. })
  }
}

impl From<AnyhowError> for ChainError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a ChainError that was boxed into anyhow by a handler rather than nesting it.
    match err.downcast::<ChainError>() {
      Ok(chain_err) => chain_err,
      Err(source) => ChainError::Handler { source },
    }
  }
}

pub type ChainResult<T, E = ChainError> = std::result::Result<T, E>;
