// onionware/src/core/context_data.rs
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::{Arc, Weak};

/// The context threaded through one dispatch.
///
/// A cheap handle over shared, lock-protected data: every handler and the
/// terminal operation receive a clone pointing at the same value, so writes made
/// before `next.run()` are visible downstream and writes made downstream are
/// visible to the unwinding handlers.
///
/// IMPORTANT: guards returned by `read`/`write` are blocking and MUST be
/// dropped before any `.await`, in particular before awaiting `next.run()`.
#[derive(Debug)]
pub struct ContextData<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> ContextData<T> {
  pub fn new(data: T) -> Self {
    ContextData(Arc::new(RwLock::new(data)))
  }

  /// Acquires a read lock. The guard MUST be dropped before any `.await` point.
  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  /// Acquires a write lock. The guard MUST be dropped before any `.await` point.
  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Runs `f` under a write lock and returns its result.
  pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    f(&mut self.0.write())
  }

  /// Takes the data back out once every other handle has been dropped.
  /// Returns `self` unchanged while clones are still alive.
  pub fn try_into_inner(self) -> Result<T, Self> {
    Arc::try_unwrap(self.0)
      .map(RwLock::into_inner)
      .map_err(ContextData)
  }

  /// A non-owning handle. Used by the chain so a continuation stored inside the
  /// context does not keep the context alive.
  pub(crate) fn downgrade(&self) -> WeakContextData<T> {
    WeakContextData(Arc::downgrade(&self.0))
  }
}

/// Non-owning counterpart of [`ContextData`].
pub(crate) struct WeakContextData<T: Send + Sync + 'static>(Weak<RwLock<T>>);

impl<T: Send + Sync + 'static> WeakContextData<T> {
  /// `None` once every `ContextData` handle has been dropped.
  pub(crate) fn upgrade(&self) -> Option<ContextData<T>> {
    self.0.upgrade().map(ContextData)
  }
}

impl<T: Send + Sync + 'static> Clone for ContextData<T> {
  fn clone(&self) -> Self {
    ContextData(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for ContextData<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}

impl<T: Send + Sync + 'static> From<T> for ContextData<T> {
  fn from(data: T) -> Self {
    Self::new(data)
  }
}
