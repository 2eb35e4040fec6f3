//! Script-catchable errors.

use crate::throwable::{Throwable, ThrowableRef, TraceFrame};

/// The catchable half of [`super::ErrorKind`]: an exception raised by script
/// code or by host-native code the script called.
#[derive(Clone, Debug)]
pub struct TargetError {
    cause: ThrowableRef,
    in_native_code: bool,
}

impl TargetError {
    /// Wrap `cause`; `in_native_code` marks exceptions raised by host calls.
    pub fn new(cause: ThrowableRef, in_native_code: bool) -> Self {
        TargetError {
            cause,
            in_native_code,
        }
    }

    /// The exception exactly as it crossed back into the interpreter.
    pub fn cause(&self) -> &ThrowableRef {
        &self.cause
    }

    /// Whether the exception came out of a host-native call. Only decides
    /// whether host frames are worth printing.
    pub fn in_native_code(&self) -> bool {
        self.in_native_code
    }

    /// The exception a script handler sees.
    ///
    /// If the cause is a reflective-invocation wrapper, its own cause is
    /// returned instead. Exactly one layer is skipped: a wrapper nested
    /// inside the real exception's cause chain belongs to the called code
    /// and stays visible.
    pub fn target(&self) -> &ThrowableRef {
        if self.cause.is_invocation_wrapper() {
            if let Some(inner) = self.cause.cause() {
                return inner;
            }
        }
        &self.cause
    }

    /// One line per exception in the cause chain, outer to inner.
    pub fn render_causes(&self) -> String {
        self.cause
            .chain()
            .map(Throwable::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Host frames of the unwrapped target, up to (not including) the first
    /// reflective-dispatch frame.
    pub fn visible_frames(&self) -> impl Iterator<Item = &TraceFrame> {
        self.target()
            .trace()
            .iter()
            .take_while(|frame| !frame.is_reflective())
    }
}
