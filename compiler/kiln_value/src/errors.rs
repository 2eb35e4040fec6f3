//! Error taxonomy for resolution and evaluation.
//!
//! # Two kinds of failure
//!
//! `ErrorKind` is a closed sum:
//! - `Resolution`: the interpreter cannot proceed with the current operation
//!   (undefined variable, missing enclosing instance, invalid static access,
//!   arity mismatch, ...). Never catchable by script code.
//! - `Target`: something the script, or host code the script called, threw.
//!   Script-level handlers may catch it and see the unwrapped exception.
//!
//! Factory functions (e.g. `undefined_variable()`) are the public way to
//! build resolution errors; they populate both the structured
//! `EvalErrorKind` and the message.

mod target;

use std::error::Error;
use std::fmt;
use std::io;

use kiln_ir::{ClassPath, Span};

use crate::throwable::ThrowableRef;
use crate::value::Value;

pub use target::TargetError;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Structured category of a resolution (non-catchable) error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Variables
    UndefinedVariable {
        name: String,
    },
    UndeclaredAssignment {
        name: String,
    },

    // Classes and construction
    ClassNotFound {
        path: String,
    },
    EnclosingInstanceRequired {
        class: String,
    },
    StaticMemberNotFound {
        member: String,
        class: String,
    },
    EnclosingMismatch {
        class: String,
        receiver: String,
    },
    NotAnObject {
        type_name: String,
    },
    UndefinedMethod {
        method: String,
        class: String,
    },

    // Calls
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    StackOverflow {
        depth: usize,
    },

    // Scopes
    ReleasedScope {
        scope: String,
    },

    /// Catch-all for errors without a structured category.
    Custom {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable { name } => write!(f, "undefined variable: {name}"),
            Self::UndeclaredAssignment { name } => {
                write!(f, "cannot assign to undeclared variable: {name}")
            }
            Self::ClassNotFound { path } => write!(f, "class not found: {path}"),
            Self::EnclosingInstanceRequired { class } => {
                write!(f, "an enclosing instance that contains {class} is required")
            }
            Self::StaticMemberNotFound { member, class } => {
                write!(f, "Static method {member}() not found in class '{class}'")
            }
            Self::EnclosingMismatch { class, receiver } => {
                write!(f, "an instance of {receiver} cannot enclose {class}")
            }
            Self::NotAnObject { type_name } => {
                write!(f, "{type_name} is not an object instance")
            }
            Self::UndefinedMethod { method, class } => {
                write!(f, "no method '{method}' on {class}")
            }
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                write!(f, "{name} expects {expected} {arg_word}, got {got}")
            }
            Self::StackOverflow { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }
            Self::ReleasedScope { scope } => write!(f, "use of released scope {scope}"),
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Fatal vs. script-catchable.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    Resolution(EvalErrorKind),
    Target(TargetError),
}

/// Additional context attached to an error, such as a hint on how to fix
/// the failing construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNote {
    pub message: String,
}

impl EvalNote {
    /// Note carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note: {}", self.message)
    }
}

/// One interpreter-level frame (a script constructor or method call).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub name: String,
    /// Call site.
    pub span: Option<Span>,
}

/// Snapshot of the interpreter call stack at the error site, most recent
/// call first.
#[derive(Clone, Debug, Default)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    /// Backtrace of `frames`, innermost first.
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "script backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: ErrorKind,
    /// Base message. For target errors the rendered form (`Display`) appends
    /// the cause chain.
    pub message: String,
    /// Node the error originated from.
    pub span: Option<Span>,
    pub backtrace: Option<EvalBacktrace>,
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    /// Resolution error with an uncategorized message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind: ErrorKind::Resolution(kind),
            message,
            span: None,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    /// Script-catchable error wrapping `cause`.
    pub fn target(
        message: impl Into<String>,
        cause: ThrowableRef,
        in_native_code: bool,
    ) -> Self {
        Self {
            kind: ErrorKind::Target(TargetError::new(cause, in_native_code)),
            message: message.into(),
            span: None,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    /// Target error for an exception thrown by script code.
    pub fn thrown(cause: ThrowableRef) -> Self {
        Self::target("TargetError", cause, false)
    }

    /// Target error for an exception surfaced from a host-native call.
    pub fn native(cause: ThrowableRef) -> Self {
        Self::target("TargetError", cause, true)
    }

    /// Attach the span of the node that failed.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach the interpreter call stack at the point of failure.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Append a hint printed under the message in debug traces.
    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    /// Whether a script-level handler may catch this error.
    #[inline]
    pub fn is_catchable(&self) -> bool {
        matches!(self.kind, ErrorKind::Target(_))
    }

    /// The script-catchable error, if this is one.
    pub fn as_target(&self) -> Option<&TargetError> {
        match &self.kind {
            ErrorKind::Target(target) => Some(target),
            ErrorKind::Resolution(_) => None,
        }
    }

    /// The interpreter-level failure, if this is not a target error.
    pub fn resolution_kind(&self) -> Option<&EvalErrorKind> {
        match &self.kind {
            ErrorKind::Resolution(kind) => Some(kind),
            ErrorKind::Target(_) => None,
        }
    }

    /// Print the error for a top-level caller.
    ///
    /// With `debug`, the rendered message, its notes and the interpreter
    /// backtrace come first, followed by a `--- Target Stack Trace ---` separator. Target
    /// errors raised in native code then list the host frames up to the
    /// first reflective-dispatch frame; script-origin target errors print no
    /// host frames since those would only show interpreter internals.
    pub fn write_stack_trace(&self, debug: bool, out: &mut dyn io::Write) -> io::Result<()> {
        if debug {
            writeln!(out, "{self}")?;
            for note in &self.notes {
                writeln!(out, "{note}")?;
            }
            if let Some(backtrace) = &self.backtrace {
                write!(out, "{backtrace}")?;
            }
            writeln!(out, "--- Target Stack Trace ---")?;
        }
        if let Some(target) = self.as_target() {
            if target.in_native_code() {
                for frame in target.visible_frames() {
                    writeln!(out, "        at {frame}")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        if let ErrorKind::Target(target) = &self.kind {
            write!(f, "\nCaused by: {}", target.render_causes())?;
        }
        Ok(())
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ErrorKind::Target(target) => Some(&**target.cause() as &(dyn Error + 'static)),
            ErrorKind::Resolution(_) => None,
        }
    }
}

// Variable Errors

/// `name` is bound in no scope of the chain.
#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn undeclared_assignment(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndeclaredAssignment {
        name: name.to_string(),
    })
}

// Class and Construction Errors

/// No class is registered under `path`.
#[cold]
pub fn class_not_found(path: &ClassPath) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ClassNotFound {
        path: path.to_string(),
    })
}

/// An instance-nested class was constructed with no live enclosing instance.
#[cold]
pub fn enclosing_instance_required(class: &ClassPath) -> EvalError {
    EvalError::from_kind(EvalErrorKind::EnclosingInstanceRequired {
        class: class.to_string(),
    })
}

/// A static class-name path reached something that is not static.
#[cold]
pub fn static_member_not_found(member: &str, class: &ClassPath) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StaticMemberNotFound {
        member: member.to_string(),
        class: class.to_string(),
    })
}

/// A qualified `receiver.new Inner()` whose receiver is not (and is not
/// nested within) an instance of the class declaring `Inner`.
#[cold]
pub fn enclosing_mismatch(class: &ClassPath, receiver: &ClassPath) -> EvalError {
    EvalError::from_kind(EvalErrorKind::EnclosingMismatch {
        class: class.to_string(),
        receiver: receiver.to_string(),
    })
}

#[cold]
pub fn not_an_object(value: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAnObject {
        type_name: value.type_name(),
    })
}

#[cold]
pub fn undefined_method(method: &str, class: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        method: method.to_string(),
        class: class.to_string(),
    })
}

// Call Errors

/// `name` was called with the wrong number of arguments.
#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn recursion_limit_exceeded(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth })
}

// Scope Errors

/// `scope` was used after it was released.
#[cold]
pub fn released_scope(scope: impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ReleasedScope {
        scope: scope.to_string(),
    })
}
