// onionware/src/core/handler.rs

//! Defines the `Handler<C, E>` and `Terminal<C, E>` types, plus the `handler` /
//! `terminal` constructors that box ordinary async closures into them.

use crate::chain::Next;
use crate::core::context_data::ContextData;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The boxed future every handler, continuation and terminal resolves through.
pub type ChainFuture<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send>>;

/// A middleware unit in a chain.
///
/// A handler receives a clone of the shared context and the continuation `next`
/// for its position. It may:
/// 1. run setup code, then `next.run().await`, then teardown code (the onion);
/// 2. never call `next`, silently ending the chain at its position;
/// 3. return `Err` instead of calling `next`, failing the whole dispatch.
///
/// Handlers are `Arc`ed so the same instance can sit in many chains and be
/// snapshotted out of an `Engine` without copying the closure.
pub type Handler<C, E> = Arc<dyn Fn(ContextData<C>, Next<C, E>) -> ChainFuture<E> + Send + Sync>;

/// The operation run once every handler has deferred to its continuation,
/// usually the actual transport call.
pub type Terminal<C, E> = Arc<dyn Fn(ContextData<C>) -> ChainFuture<E> + Send + Sync>;

/// Wraps an async closure into a [`Handler`].
///
/// The closure may use its own error type as long as it converts into the
/// chain's error type `E`.
///
/// ```ignore
/// let timing = handler(|ctx: ContextData<MyCtx>, next: Next<MyCtx, MyError>| async move {
///   let started = std::time::Instant::now();
///   next.run().await?;
///   ctx.write().elapsed = Some(started.elapsed());
///   Ok::<_, MyError>(())
/// });
/// ```
pub fn handler<C, E, F, Fut, UserErr>(handler_fn: F) -> Handler<C, E>
where
  C: Send + Sync + 'static,
  E: 'static,
  F: Fn(ContextData<C>, Next<C, E>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<(), UserErr>> + Send + 'static,
  UserErr: Into<E> + 'static,
{
  Arc::new(move |ctx_data: ContextData<C>, next: Next<C, E>| -> ChainFuture<E> {
    let user_fut = handler_fn(ctx_data, next);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}

/// Wraps an async closure into a [`Terminal`].
pub fn terminal<C, E, F, Fut, UserErr>(terminal_fn: F) -> Terminal<C, E>
where
  C: Send + Sync + 'static,
  E: 'static,
  F: Fn(ContextData<C>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<(), UserErr>> + Send + 'static,
  UserErr: Into<E> + 'static,
{
  Arc::new(move |ctx_data: ContextData<C>| -> ChainFuture<E> {
    let user_fut = terminal_fn(ctx_data);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}
