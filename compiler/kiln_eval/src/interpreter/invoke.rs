//! Body invocation, method calls, host calls and target-error routing.

use std::sync::Arc;

use kiln_ir::ScopeId;
use kiln_stack::ensure_sufficient_stack;
use kiln_value::{
    arity_mismatch, not_an_object, undefined_method, ErrorKind, EvalError, EvalResult, ObjectRef,
    Value,
};
use tracing::debug;

use crate::classes::Callable;
use crate::diagnostics::CallFrame;
use crate::host::HostFailure;
use crate::scope::ScopeGuard;

use super::CallContext;

impl<'interp> CallContext<'interp> {
    /// `receiver.name(args)` for a script object.
    ///
    /// The body runs with `this` bound to the receiver, in a frame scope
    /// chained to the receiver's scope.
    #[tracing::instrument(level = "debug", skip_all, fields(method = name))]
    pub fn call_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> EvalResult {
        let object = receiver
            .as_object()
            .ok_or_else(|| self.locate(not_an_object(receiver)))?;
        let class = self
            .interp
            .classes
            .lookup(object.class())
            .ok_or_else(|| self.locate(undefined_method(name, &object.class().to_string())))?;
        let method = class
            .find_method(name)
            .ok_or_else(|| self.locate(undefined_method(name, &object.class().to_string())))?;
        let frame_name = format!("{}.{name}", object.class());
        self.invoke(frame_name, method, object.scope(), Some(object.clone()), args)
    }

    /// Call host-native `target`. A host exception becomes a native target
    /// error wrapping the exception exactly as the host reported it.
    pub fn call_native(&mut self, target: &str, args: &[Value]) -> EvalResult {
        match self.interp.host.invoke(target, args) {
            Ok(value) => Ok(value),
            Err(HostFailure::Thrown(throwable)) => {
                debug!(host_target = target, exception = %throwable, "host call threw");
                Err(self.locate(EvalError::native(throwable)))
            }
            Err(HostFailure::Unresolved { target }) => {
                Err(self.locate(undefined_method(&target, "host")))
            }
        }
    }

    /// Run `body`, handing a target error to the caller as the unwrapped
    /// exception value, the way a script `catch` sees it.
    ///
    /// Resolution errors are not catchable and pass through unchanged.
    pub fn catch_target<F>(&mut self, body: F) -> Result<Result<Value, Value>, EvalError>
    where
        F: FnOnce(&mut Self) -> EvalResult,
    {
        match body(self) {
            Ok(value) => Ok(Ok(value)),
            Err(err) => {
                if let Some(target) = err.as_target() {
                    return Ok(Err(Value::Exception(Arc::clone(target.target()))));
                }
                Err(err)
            }
        }
    }

    /// Invoke `callable` as `frame_name` in a fresh frame scope under
    /// `parent`, with `this` bound to `this`.
    pub(crate) fn invoke(
        &mut self,
        frame_name: String,
        callable: &Callable,
        parent: ScopeId,
        this: Option<ObjectRef>,
        args: Vec<Value>,
    ) -> EvalResult {
        if args.len() != callable.arity() {
            return Err(self.locate(arity_mismatch(&frame_name, callable.arity(), args.len())));
        }
        let interp = self.interp;

        let mut call_stack = self.call_stack.clone();
        call_stack
            .push(CallFrame::new(frame_name.as_str(), self.span))
            .map_err(|err| self.locate(err))?;

        let frame = interp
            .scopes
            .alloc(&frame_name, Some(parent))
            .map_err(|err| self.locate(err))?;
        let frame = ScopeGuard::new(&interp.scopes, frame);
        for (param, arg) in callable.params().iter().zip(args) {
            interp
                .scopes
                .declare_local(frame.scope(), param, arg)
                .map_err(|err| self.locate(err))?;
        }

        let mut callee = CallContext {
            interp,
            scope: frame.scope(),
            this,
            call_stack,
            span: None,
        };
        let body = callable.body();
        ensure_sufficient_stack(|| body(&mut callee)).map_err(|err| callee.route_failure(err))
    }

    /// Attach location to an error leaving a body. The kind is never
    /// changed: a target error stays catchable however many frames it
    /// crosses, and a resolution error never becomes catchable.
    fn route_failure(&self, err: EvalError) -> EvalError {
        match &err.kind {
            ErrorKind::Target(target) => debug!(
                in_native_code = target.in_native_code(),
                cause = %target.cause(),
                "target error left a body"
            ),
            ErrorKind::Resolution(kind) => debug!(%kind, "resolution error left a body"),
        }
        self.locate(err)
    }
}
