// onionware/src/chain/mod.rs

//! The composer: turns a handler sequence plus an optional terminal into one runnable `Chain`.

pub mod compose;
pub(crate) mod execution;

pub use compose::{compose_chain, compose_erased, Chain};
pub use execution::Next;
