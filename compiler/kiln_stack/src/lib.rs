//! Stack safety for re-entrant script invocation.
//!
//! Constructing an instance runs its constructor body, which may construct
//! further instances (an outer constructor building its inner objects, a
//! method returning `new Inner()`), each re-entering the host closure that
//! stands in for the evaluator. Every such re-entry goes through
//! [`ensure_sufficient_stack`] so deep object graphs do not overflow the
//! native stack.
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: plain passthrough.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_SEGMENT: usize = 1024 * 1024;

/// Run `f` with at least [`RED_ZONE`] bytes of stack available.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
