// onionware/src/lib.rs

//! Onionware: composable async handler chains for Rust.
//!
//! Handlers wrap a single terminal operation (usually a network call) in
//! onion order: each handler runs setup code, awaits the rest of the chain
//! through its continuation, then runs teardown code as the chain unwinds.
//!
//!  - `compose_chain` turns an ordered handler list plus an optional terminal
//!    into one reusable [`Chain`].
//!  - [`Engine`] keeps a registry of global handlers and dispatches each call
//!    through `registered ++ extra` handlers, snapshotting the registry per call.
//!  - Continuations are guarded: running one twice, or out of order, fails with
//!    [`ChainError::ProtocolViolation`] instead of re-running the downstream chain.
//!  - Handler and terminal errors propagate unchanged.
//!  - The [`transport`] module holds the adapter contract a terminal calls into.

pub mod core;
pub mod chain;
pub mod engine;
pub mod transport;
pub mod error;

// --- Re-exports for the Public API ---

pub use crate::core::context_data::ContextData;
pub use crate::core::handler::{handler, terminal, ChainFuture, Handler, Terminal};

pub use crate::chain::{compose_chain, compose_erased, Chain, Next};

pub use crate::engine::Engine;

pub use crate::transport::{
  transport_terminal, Exchange, FnTransport, Method, RequestConfig, ResponseData, ResponseType, Transport,
  TransportError,
};

pub use crate::error::{ChainError, ChainResult};

/*
    Typical use:
    1. Define a context struct `MyCtx` carrying the request and, later, the response.
    2. Create an `Engine<MyCtx, MyError>` (MyError: From<ChainError>) once per client.
    3. Register cross-cutting handlers with `engine.register(handler(|ctx, next| async move { .. }))`.
    4. Per call, wrap a `MyCtx` in `ContextData` and
       `engine.dispatch(ctx.clone(), Some(transport_terminal(transport)), &[]).await`.
    5. Read the response back out of `ctx`.
*/
