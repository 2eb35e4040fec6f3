//! Scope handles.
//!
//! Scopes live in an arena owned by the evaluator. Everything else refers to
//! them through `ScopeId`, a slot index paired with the generation the slot
//! had when the scope was allocated. Releasing a scope bumps the slot's
//! generation, so a stale handle is detected instead of silently aliasing
//! whatever scope reuses the slot.

use std::fmt;

/// Generation-checked handle into the scope arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ScopeId {
    index: u32,
    generation: u32,
}

impl ScopeId {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        ScopeId { index, generation }
    }

    /// Slot index in the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn slot(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}v{}", self.index, self.generation)
    }
}

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::ScopeId;
    crate::static_assert_size!(ScopeId, 8);
}
