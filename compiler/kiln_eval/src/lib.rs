//! Kiln Eval - scope chains and object construction for the Kiln interpreter.
//!
//! # Architecture
//!
//! - `ScopeArena`: every scope of one interpreter, addressed by generational
//!   `ScopeId`s; local scopes and scopes backed by an `ExternalStore`
//! - `EnclosingResolver`: decides which live instance an inner class
//!   instance is bound to
//! - `CallContext::construct*`: the construction coordinator (resolve,
//!   allocate, bind owner, initialize fields, run the constructor)
//! - `CallContext::call_native` / `catch_target`: host calls and routing of
//!   script-catchable target errors
//!
//! Statement evaluation is not part of this crate: constructor and method
//! bodies are host closures over a `CallContext`.

mod classes;
mod config;
mod diagnostics;
mod enclosing;
mod host;
mod interpreter;
mod scope;
mod shared;

use std::sync::Once;

pub use kiln_value::{
    ErrorKind, EvalError, EvalErrorKind, EvalResult, ObjectRef, TargetError, Throwable,
    ThrowableRef, TraceFrame, Value,
};

pub use classes::{Body, Callable, ClassDef, ClassRegistry, ClassTable, Nesting};
pub use config::{AssignPolicy, InterpreterConfig, DEFAULT_COLLECT_THRESHOLD};
pub use diagnostics::{CallFrame, CallStack};
pub use enclosing::{ConstructTarget, EnclosingBinding, EnclosingResolver, Receiver, Resolved};
pub use host::{HostBridge, HostFailure, HostFunctions};
pub use interpreter::{CallContext, Interpreter, InterpreterBuilder};
pub use scope::{
    CollectStats, ExternalStore, MapStore, ScopeArena, ScopeGuard, ScopeKind, ScopeNode, SharedStore,
    StoreError, THIS,
};
pub use shared::{SharedMutableRegistry, SharedRegistry};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only the first call counts.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
mod tests;
