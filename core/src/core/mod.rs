pub mod context_data;
pub mod handler;

// Re-export key types for easier access from other modules (and lib.rs)
pub use context_data::ContextData;
pub use handler::{handler, terminal, ChainFuture, Handler, Terminal};
