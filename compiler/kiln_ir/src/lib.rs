//! Kiln IR - identifiers shared across the interpreter crates.
//!
//! This crate contains the small, `Copy`-friendly handles the rest of the
//! interpreter passes around:
//! - `Span` for the location of the node an error originated from
//! - `ClassPath` for dotted class names (`Outer.Inner`)
//! - `ScopeId` for generation-checked handles into the scope arena
//!
//! Nothing here depends on runtime values; the value and evaluator crates
//! build on top of it.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-copied handles.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod class_path;
mod scope_id;
mod span;

pub use class_path::ClassPath;
pub use scope_id::ScopeId;
pub use span::Span;
