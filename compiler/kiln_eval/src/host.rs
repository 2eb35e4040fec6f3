//! Host-native call bridge.
//!
//! Scripts call into the host through `HostBridge`. A host exception comes
//! back as a `Throwable`, possibly wrapped by the host's reflective dispatch;
//! the interpreter turns it into a native target error.

use std::fmt;

use kiln_value::{ThrowableRef, Value};
use rustc_hash::FxHashMap;

/// Why a host call produced no value.
#[derive(Clone, Debug)]
pub enum HostFailure {
    /// The host code threw.
    Thrown(ThrowableRef),
    /// Nothing is registered under the requested target.
    Unresolved { target: String },
}

/// Dispatch of host-native calls by target name.
pub trait HostBridge: Send + Sync {
    fn invoke(&self, target: &str, args: &[Value]) -> Result<Value, HostFailure>;
}

type HostFn = Box<dyn Fn(&[Value]) -> Result<Value, ThrowableRef> + Send + Sync>;

/// Closure table bridge.
#[derive(Default)]
pub struct HostFunctions {
    functions: FxHashMap<String, HostFn>,
}

impl HostFunctions {
    /// Bridge with no targets registered.
    pub fn new() -> Self {
        HostFunctions::default()
    }

    /// Register `function` under `target`, replacing any earlier one.
    #[must_use]
    pub fn register<F>(mut self, target: &str, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ThrowableRef> + Send + Sync + 'static,
    {
        self.functions
            .insert(target.to_string(), Box::new(function));
        self
    }
}

impl HostBridge for HostFunctions {
    fn invoke(&self, target: &str, args: &[Value]) -> Result<Value, HostFailure> {
        let function = self
            .functions
            .get(target)
            .ok_or_else(|| HostFailure::Unresolved {
                target: target.to_string(),
            })?;
        function(args).map_err(HostFailure::Thrown)
    }
}

impl fmt::Debug for HostFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut targets: Vec<_> = self.functions.keys().collect();
        targets.sort_unstable();
        f.debug_tuple("HostFunctions").field(&targets).finish()
    }
}
