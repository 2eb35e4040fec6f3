//! Scopes backed by a host-owned key/value store.
//!
//! The store is the single source of truth: every read and write goes
//! straight through, nothing is cached, so changes made by the host between
//! script statements are visible immediately.
//!
//! Stores have no null of their own. A key present with a `None` value is
//! the store's native null and reads back as `Value::Null`; writing
//! `Value::Null` stores `None`. An absent key is an unbound name. Presence
//! and value come back from one `get` call, so a host write racing with the
//! read is seen either entirely or not at all.

use std::sync::Arc;

use kiln_value::{EvalError, Throwable, Value};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Failure reported by an external store on write.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store is read-only")]
    ReadOnly,
}

/// Host-owned key/value storage.
///
/// Implementations must be safe to call from several threads; other host
/// threads may change the store at any time.
pub trait ExternalStore: Send + Sync {
    /// Whether `key` is present, including when it maps to the native null.
    fn contains_key(&self, key: &str) -> bool;

    /// The entry for `key` in a single read: `None` if absent, `Some(None)`
    /// for the native null.
    fn get(&self, key: &str) -> Option<Option<Value>>;

    /// Store `value` under `key`; `None` stores the native null.
    fn put(&self, key: &str, value: Option<Value>) -> Result<(), StoreError>;

    /// Every key currently present, in no particular order.
    fn keys(&self) -> Vec<String>;
}

/// Store handle shared between the host and the scopes backed by it.
pub type SharedStore = Arc<dyn ExternalStore>;

/// In-memory store, usable directly by hosts and tests.
#[derive(Debug, Default)]
pub struct MapStore {
    entries: RwLock<FxHashMap<String, Option<Value>>>,
    read_only: bool,
}

impl MapStore {
    /// An empty, writable store.
    pub fn new() -> Self {
        MapStore::default()
    }

    /// A store that rejects every write.
    pub fn read_only(entries: impl IntoIterator<Item = (String, Option<Value>)>) -> Self {
        MapStore {
            entries: RwLock::new(entries.into_iter().collect()),
            read_only: true,
        }
    }

    /// Insert from the host side, bypassing the interpreter.
    pub fn insert(&self, key: impl Into<String>, value: Option<Value>) {
        let _previous = self.entries.write().insert(key.into(), value);
    }

    /// Number of keys, native nulls included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ExternalStore for MapStore {
    fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Option<Value>> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: Option<Value>) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let _previous = self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

/// Scope bindings that translate to and from a store.
pub(super) struct ExternalBindings {
    store: SharedStore,
    /// Serializes check-then-write sequences issued through this scope.
    write_gate: Mutex<()>,
}

impl ExternalBindings {
    pub(super) fn new(store: SharedStore) -> Self {
        ExternalBindings {
            store,
            write_gate: Mutex::new(()),
        }
    }

    pub(super) fn read(&self, name: &str) -> Option<Value> {
        self.store
            .get(name)
            .map(|entry| entry.unwrap_or(Value::Null))
    }

    pub(super) fn write(&self, name: &str, value: Value) -> Result<(), EvalError> {
        let _gate = self.write_gate.lock();
        self.put(name, value)
    }

    pub(super) fn replace_if_bound(&self, name: &str, value: Value) -> Result<bool, EvalError> {
        let _gate = self.write_gate.lock();
        if !self.store.contains_key(name) {
            return Ok(false);
        }
        self.put(name, value)?;
        Ok(true)
    }

    pub(super) fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    pub(super) fn names(&self) -> Vec<String> {
        self.store.keys()
    }

    fn put(&self, name: &str, value: Value) -> Result<(), EvalError> {
        let native = if value.is_null() { None } else { Some(value) };
        self.store
            .put(name, native)
            .map_err(|err| store_failure(name, &err))
    }
}

/// A store write failure is host-native code failing, so it surfaces as a
/// catchable target error.
fn store_failure(key: &str, err: &StoreError) -> EvalError {
    tracing::debug!(key, error = %err, "external store write failed");
    EvalError::native(Throwable::new("StoreError", format!("{key}: {err}")).into_ref())
}
