//! Interpreter call stack.
//!
//! `CallStack` tracks the constructor and method invocations currently in
//! progress and snapshots them into an `EvalBacktrace` when an error leaves
//! a body. Host frames are not tracked here; they travel on the
//! `Throwable` itself.

use kiln_ir::Span;
use kiln_value::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace, EvalError};

/// One constructor or method invocation in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// Display name, e.g. `Outer.Inner.<init>` or `Outer.go`.
    pub name: String,
    /// Where the call was made, not where the callee is defined.
    pub call_span: Option<Span>,
}

impl CallFrame {
    /// Frame for `name`, called from `call_span`.
    pub fn new(name: impl Into<String>, call_span: Option<Span>) -> Self {
        CallFrame {
            name: name.into(),
            call_span,
        }
    }
}

/// Live call stack for one chain of invocations.
///
/// # Clone-per-child model
///
/// Every invocation clones the caller's stack and pushes onto the clone, so
/// nothing is shared between host threads calling into one interpreter.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `None` means unlimited; the native stack grows on demand.
    pub fn new(max_depth: Option<usize>) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, or fail with a stack-overflow error without pushing.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Leave the innermost frame.
    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The innermost frame.
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Snapshot, most recent call first.
    pub fn capture(&self) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|frame| BacktraceFrame {
                name: frame.name.clone(),
                span: frame.call_span,
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach a snapshot to `err` unless it already carries one from a
    /// deeper frame.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() || err.backtrace.is_some() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}
