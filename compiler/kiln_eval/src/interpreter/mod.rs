//! The interpreter and its per-invocation call context.
//!
//! `Interpreter` owns the scope arena and the shared registries and is
//! `Send + Sync`: several host threads may resolve and assign variables, and
//! construct objects, through one interpreter at the same time. Every
//! constructor or method invocation runs with its own `CallContext`, which
//! carries the current scope, `this`, the call stack and the span of the
//! node being evaluated.

mod builder;
mod construct;
mod invoke;

use std::sync::Arc;

use kiln_ir::{ClassPath, ScopeId, Span};
use kiln_value::{not_an_object, undefined_variable, EvalError, EvalResult, ObjectRef, Throwable, Value};
use tracing::trace;

use crate::classes::ClassRegistry;
use crate::config::InterpreterConfig;
use crate::diagnostics::CallStack;
use crate::host::HostBridge;
use crate::scope::{CollectStats, ScopeArena, ScopeKind, SharedStore};
use crate::shared::SharedRegistry;

pub use builder::InterpreterBuilder;

/// Scope chains plus the registries construction and host calls read.
pub struct Interpreter {
    scopes: Arc<ScopeArena>,
    classes: SharedRegistry<dyn ClassRegistry>,
    host: SharedRegistry<dyn HostBridge>,
    config: InterpreterConfig,
    global: ScopeId,
}

impl Interpreter {
    /// Start configuring an interpreter.
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// The root of every scope chain.
    #[inline]
    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    /// Every scope this interpreter has allocated.
    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    /// Settings the interpreter was built with.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn classes(&self) -> &dyn ClassRegistry {
        &*self.classes
    }

    /// Reclaim instances kept alive only by holding each other.
    pub fn collect_cycles(&self) -> CollectStats {
        self.scopes.collect_cycles()
    }

    /// Allocate a local scope under `parent` (the global scope if `None`).
    pub fn new_scope(&self, label: &str, parent: Option<ScopeId>) -> Result<ScopeId, EvalError> {
        self.scopes
            .alloc(label, Some(parent.unwrap_or(self.global)))
    }

    /// Allocate a scope whose bindings live in `store`.
    pub fn new_external_scope(
        &self,
        label: &str,
        parent: Option<ScopeId>,
        store: SharedStore,
    ) -> Result<ScopeId, EvalError> {
        self.scopes
            .alloc_external(label, Some(parent.unwrap_or(self.global)), store)
    }

    /// Release a scope allocated with `new_scope`/`new_external_scope`.
    /// Instance scopes are released by dropping the instance instead.
    pub fn release_scope(&self, scope: ScopeId) -> bool {
        self.scopes.release(scope)
    }

    /// Whether `scope` keeps its bindings locally or in a host store.
    pub fn scope_kind(&self, scope: ScopeId) -> Result<ScopeKind, EvalError> {
        self.scopes.kind(scope)
    }

    /// Value of `name` as seen from `scope`.
    pub fn resolve_variable(&self, scope: ScopeId, name: &str) -> EvalResult {
        trace!(name, scope = %scope, "resolve");
        self.scopes.get(scope, name)
    }

    /// Bind `name` in `scope` itself.
    pub fn declare_variable(&self, scope: ScopeId, name: &str, value: Value) -> Result<(), EvalError> {
        trace!(name, scope = %scope, "declare");
        self.scopes.declare_local(scope, name, value)
    }

    /// Assign to the nearest binding of `name`; returns the scope written.
    ///
    /// An unbound name is handled per the configured `AssignPolicy`.
    pub fn assign_variable(&self, scope: ScopeId, name: &str, value: Value) -> Result<ScopeId, EvalError> {
        trace!(name, scope = %scope, "assign");
        self.scopes
            .set_existing(scope, name, value, self.config.assign_policy)
    }

    /// Top-level context evaluating in `scope`. `this` is the nearest scope
    /// owner, if any.
    pub fn context(&self, scope: ScopeId) -> CallContext<'_> {
        let this = self
            .scopes
            .owners(scope)
            .ok()
            .and_then(|owners| owners.into_iter().next());
        CallContext {
            interp: self,
            scope,
            this,
            call_stack: CallStack::new(self.config.max_call_depth),
            span: None,
        }
    }

    /// `new path(args)` evaluated in `scope`.
    pub fn construct(&self, scope: ScopeId, path: &ClassPath, args: Vec<Value>) -> EvalResult {
        self.context(scope).construct(path, args)
    }
}

/// Evaluation state of one body invocation (or of top-level host code).
pub struct CallContext<'interp> {
    interp: &'interp Interpreter,
    scope: ScopeId,
    this: Option<ObjectRef>,
    call_stack: CallStack,
    span: Option<Span>,
}

impl<'interp> CallContext<'interp> {
    /// The interpreter this context evaluates in.
    pub fn interpreter(&self) -> &'interp Interpreter {
        self.interp
    }

    #[inline]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The receiver of the running body; `None` in static and top-level
    /// contexts.
    pub fn this(&self) -> Option<&ObjectRef> {
        self.this.as_ref()
    }

    /// Frames of the bodies currently running in this context.
    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Record the node currently being evaluated. Errors raised from here
    /// on that carry no location yet are attributed to it.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.span = Some(span);
        self
    }

    /// Value of `name` as seen from the current scope.
    pub fn get(&self, name: &str) -> EvalResult {
        self.interp
            .resolve_variable(self.scope, name)
            .map_err(|err| self.locate(err))
    }

    /// Bind `name` in the current scope itself.
    pub fn declare(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.interp
            .declare_variable(self.scope, name, value)
            .map_err(|err| self.locate(err))
    }

    /// Assign to the nearest binding of `name`; see
    /// `Interpreter::assign_variable`.
    pub fn assign(&self, name: &str, value: Value) -> Result<ScopeId, EvalError> {
        self.interp
            .assign_variable(self.scope, name, value)
            .map_err(|err| self.locate(err))
    }

    /// `receiver.name`: resolved through the receiver's own scope chain, so
    /// an inner instance also sees its enclosing instance's fields.
    pub fn field(&self, receiver: &Value, name: &str) -> EvalResult {
        let object = receiver
            .as_object()
            .ok_or_else(|| self.locate(not_an_object(receiver)))?;
        self.interp
            .scopes
            .lookup(object.scope(), name)
            .map_err(|err| self.locate(err))?
            .ok_or_else(|| self.locate(undefined_variable(name)))
    }

    /// `receiver.name = value`: always written to the receiver's own scope.
    pub fn set_field(&self, receiver: &Value, name: &str, value: Value) -> Result<(), EvalError> {
        let object = receiver
            .as_object()
            .ok_or_else(|| self.locate(not_an_object(receiver)))?;
        self.interp
            .scopes
            .declare_local(object.scope(), name, value)
            .map_err(|err| self.locate(err))
    }

    /// Error for a script-level `throw`.
    pub fn throw(&self, throwable: Throwable) -> EvalError {
        self.locate(EvalError::thrown(throwable.into_ref()))
    }

    /// Attribute `err` to the current node and call stack unless a deeper
    /// frame already did.
    pub(crate) fn locate(&self, err: EvalError) -> EvalError {
        let err = match (err.span, self.span) {
            (None, Some(span)) => err.with_span(span),
            _ => err,
        };
        self.call_stack.attach_backtrace(err)
    }
}
