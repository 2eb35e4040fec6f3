//! Thread-safe shared registry wrappers.
//!
//! The class registry and host bridge are shared by every call context and
//! by every host thread calling into the same interpreter.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, immutable handle to a registry (possibly a trait object).
pub struct SharedRegistry<T: ?Sized>(Arc<T>);

impl<T: ?Sized> SharedRegistry<T> {
    /// Share an already reference-counted registry.
    pub fn from_arc(registry: Arc<T>) -> Self {
        SharedRegistry(registry)
    }
}

impl<T: ?Sized> Clone for SharedRegistry<T> {
    fn clone(&self) -> Self {
        SharedRegistry(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for SharedRegistry<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: ?Sized> fmt::Debug for SharedRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedRegistry({:p})", Arc::as_ptr(&self.0))
    }
}

/// Shared registry that can still be extended after it was handed out.
pub struct SharedMutableRegistry<T>(Arc<RwLock<T>>);

impl<T> SharedMutableRegistry<T> {
    /// Wrap `registry` for shared mutation.
    pub fn new(registry: T) -> Self {
        SharedMutableRegistry(Arc::new(RwLock::new(registry)))
    }

    /// Shared access; blocks while a writer holds the registry.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Exclusive access. Do not hold the guard across interpreter calls
    /// that read the same registry.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }
}

impl<T> Clone for SharedMutableRegistry<T> {
    fn clone(&self) -> Self {
        SharedMutableRegistry(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for SharedMutableRegistry<T> {
    fn default() -> Self {
        SharedMutableRegistry::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedMutableRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedMutableRegistry({:?})", &*self.0.read())
    }
}
