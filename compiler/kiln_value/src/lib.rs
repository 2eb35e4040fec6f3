//! Kiln Value - runtime values and the error taxonomy.
//!
//! This crate holds everything that flows *through* the evaluator without
//! depending on it:
//! - `Value`, including the null marker and object instances
//! - `Throwable`, the host/script exception model with its cause chain
//! - `EvalError`, split into fatal resolution errors and script-catchable
//!   target errors (`ErrorKind`)
//!
//! Instances refer to their scope through a `ScopeLease`; the arena that
//! actually stores scopes lives in `kiln_eval` and plugs in through the
//! `ReleaseScope` trait.

mod errors;
mod throwable;
mod value;

pub use errors::{
    arity_mismatch, class_not_found, enclosing_instance_required, enclosing_mismatch,
    not_an_object, recursion_limit_exceeded, released_scope, static_member_not_found,
    undeclared_assignment, undefined_method, undefined_variable, BacktraceFrame, ErrorKind,
    EvalBacktrace, EvalError, EvalErrorKind, EvalNote, EvalResult, TargetError,
};
pub use throwable::{Throwable, ThrowableKind, ThrowableRef, TraceFrame};
pub use value::{Instance, ObjectRef, ReleaseScope, ScopeLease, Value, WeakObjectRef};
