//! Exceptions thrown by host-native code or by scripts.
//!
//! A `Throwable` is what a host call (or a script `throw`) raises: a class
//! name, an optional message, an optional cause, and the host stack frames
//! captured when it was thrown. Reflective dispatch in the host bridge wraps
//! the real exception in an [`ThrowableKind::InvocationWrapper`]; target
//! errors peel exactly that one layer off again.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Shared, immutable exception.
pub type ThrowableRef = Arc<Throwable>;

/// Class name used for wrappers introduced by reflective invocation.
const INVOCATION_WRAPPER_CLASS: &str = "reflect.InvocationTargetException";

/// What a throwable stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThrowableKind {
    /// An exception raised by host or script code.
    Exception,
    /// Added by the host's reflective call machinery around the exception
    /// the called code actually threw.
    InvocationWrapper,
}

/// One host stack frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceFrame {
    /// Fully qualified declaring context, e.g. `host.io.FileStore` or
    /// `host.reflect.Method`.
    pub declaring: String,
    pub method: String,
    /// `file:line`, when the host knows it.
    pub location: Option<String>,
}

impl TraceFrame {
    /// Frame of `method` in `declaring`, location unknown.
    pub fn new(declaring: impl Into<String>, method: impl Into<String>) -> Self {
        TraceFrame {
            declaring: declaring.into(),
            method: method.into(),
            location: None,
        }
    }

    /// Set the source location, such as `Stream.java:42`.
    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Whether this frame belongs to reflective-invocation machinery: its
    /// declaring context mentions `reflect` anywhere, so `host.reflect.Method`
    /// and `host.reflection.Dispatch` both count.
    pub fn is_reflective(&self) -> bool {
        self.declaring.contains("reflect")
    }
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring, self.method)?;
        match &self.location {
            Some(location) => write!(f, "({location})"),
            None => f.write_str("(Unknown Source)"),
        }
    }
}

/// A thrown exception with its cause chain.
#[derive(Clone, Debug)]
pub struct Throwable {
    kind: ThrowableKind,
    class_name: String,
    message: Option<String>,
    cause: Option<ThrowableRef>,
    trace: Vec<TraceFrame>,
}

impl Throwable {
    /// Exception of class `class_name` with `message`.
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Throwable {
            kind: ThrowableKind::Exception,
            class_name: class_name.into(),
            message: Some(message.into()),
            cause: None,
            trace: Vec::new(),
        }
    }

    pub fn without_message(class_name: impl Into<String>) -> Self {
        Throwable {
            kind: ThrowableKind::Exception,
            class_name: class_name.into(),
            message: None,
            cause: None,
            trace: Vec::new(),
        }
    }

    /// Wrap `cause` the way reflective dispatch does.
    pub fn invocation_wrapper(cause: ThrowableRef) -> Self {
        Throwable {
            kind: ThrowableKind::InvocationWrapper,
            class_name: INVOCATION_WRAPPER_CLASS.to_string(),
            message: None,
            cause: Some(cause),
            trace: Vec::new(),
        }
    }

    /// Chain `cause` as the exception that led to this one.
    #[must_use]
    pub fn with_cause(mut self, cause: ThrowableRef) -> Self {
        self.cause = Some(cause);
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: Vec<TraceFrame>) -> Self {
        self.trace = trace;
        self
    }

    /// Share the exception.
    pub fn into_ref(self) -> ThrowableRef {
        Arc::new(self)
    }

    #[inline]
    pub fn kind(&self) -> ThrowableKind {
        self.kind
    }

    #[inline]
    pub fn is_invocation_wrapper(&self) -> bool {
        self.kind == ThrowableKind::InvocationWrapper
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Detail message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&ThrowableRef> {
        self.cause.as_ref()
    }

    /// Host stack frames, innermost first.
    pub fn trace(&self) -> &[TraceFrame] {
        &self.trace
    }

    /// `self`, then its cause, then the cause's cause, until the chain ends.
    pub fn chain(&self) -> impl Iterator<Item = &Throwable> {
        std::iter::successors(Some(self), |&throwable| throwable.cause.as_deref())
    }
}

impl fmt::Display for Throwable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.class_name),
            None => f.write_str(&self.class_name),
        }
    }
}

impl Error for Throwable {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests;
