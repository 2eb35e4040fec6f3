//! Dotted class paths.
//!
//! `Outer.Inner` is stored as its segments so nesting can be navigated
//! without re-splitting strings: `outer()` drops the last segment, `child()`
//! appends one. Most paths are one to three segments deep, so segments are
//! kept inline.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// A class name path such as `Outer` or `Outer.Inner`.
///
/// Empty segments are dropped on construction, so `"Outer..Inner"` and
/// `"Outer.Inner"` name the same class.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
pub struct ClassPath {
    segments: SmallVec<[Arc<str>; 4]>,
}

impl ClassPath {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ClassPath {
            segments: segments
                .into_iter()
                .filter(|segment| !segment.as_ref().is_empty())
                .map(|segment| Arc::from(segment.as_ref()))
                .collect(),
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(AsRef::as_ref)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment: `Inner` for `Outer.Inner`.
    pub fn simple_name(&self) -> &str {
        self.segments.last().map_or("", AsRef::as_ref)
    }

    /// The enclosing path, or `None` for a single-segment path.
    pub fn outer(&self) -> Option<ClassPath> {
        if self.segments.len() < 2 {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(ClassPath { segments })
    }

    /// Append a single member name.
    #[must_use]
    pub fn child(&self, name: &str) -> ClassPath {
        self.join(&ClassPath::from(name))
    }

    /// Append every segment of `relative`.
    #[must_use]
    pub fn join(&self, relative: &ClassPath) -> ClassPath {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        ClassPath { segments }
    }

    /// True if `self` is strictly nested (at any depth) inside `other`.
    pub fn is_nested_within(&self, other: &ClassPath) -> bool {
        self.segments.len() > other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }
}

impl From<&str> for ClassPath {
    fn from(path: &str) -> Self {
        ClassPath::from_segments(path.split('.'))
    }
}

impl From<String> for ClassPath {
    fn from(path: String) -> Self {
        ClassPath::from(path.as_str())
    }
}

impl fmt::Display for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassPath({self})")
    }
}
