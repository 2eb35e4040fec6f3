//! Object instances and the scope lease that ties them to their scope.

use std::fmt;
use std::sync::{Arc, Weak};

use kiln_ir::{ClassPath, ScopeId};

/// Releases scopes back to whatever arena allocated them.
///
/// Implemented by the evaluator's scope arena. Kept as a trait so values do
/// not depend on the arena's concrete type.
pub trait ReleaseScope: Send + Sync {
    fn release(&self, scope: ScopeId);
}

/// Ownership of one scope for as long as the lease is alive.
///
/// Dropping the lease releases the scope. The arena is held weakly: an
/// instance that outlives its interpreter has nothing left to release.
pub struct ScopeLease {
    scope: ScopeId,
    arena: Weak<dyn ReleaseScope>,
}

impl ScopeLease {
    /// Lease on `scope`, released through `arena` on drop.
    pub fn new(scope: ScopeId, arena: Weak<dyn ReleaseScope>) -> Self {
        ScopeLease { scope, arena }
    }

    #[inline]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl Drop for ScopeLease {
    fn drop(&mut self) {
        if let Some(arena) = self.arena.upgrade() {
            arena.release(self.scope);
        }
    }
}

impl fmt::Debug for ScopeLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopeLease").field(&self.scope).finish()
    }
}

/// A constructed script object.
///
/// Fields live in the instance's scope, not here. The instance only records
/// which class it is, which scope it owns, and the enclosing instance it was
/// constructed against (for instance-nested classes).
#[derive(Debug)]
pub struct Instance {
    class: ClassPath,
    lease: ScopeLease,
    enclosing: Option<ObjectRef>,
}

/// Shared handle to an [`Instance`]. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<Instance>);

impl ObjectRef {
    /// Instance of `class` owning the scope behind `lease`.
    pub fn new(class: ClassPath, lease: ScopeLease, enclosing: Option<ObjectRef>) -> Self {
        ObjectRef(Arc::new(Instance {
            class,
            lease,
            enclosing,
        }))
    }

    /// The instantiated class.
    #[inline]
    pub fn class(&self) -> &ClassPath {
        &self.0.class
    }

    #[inline]
    pub fn scope(&self) -> ScopeId {
        self.0.lease.scope()
    }

    /// The instance this one was constructed inside of, if its class is
    /// instance-nested.
    #[inline]
    pub fn enclosing(&self) -> Option<&ObjectRef> {
        self.0.enclosing.as_ref()
    }

    /// Walk `self`, then its enclosing instance, then that one's, and so on.
    pub fn enclosing_chain(&self) -> impl Iterator<Item = &ObjectRef> {
        std::iter::successors(Some(self), |&object| object.enclosing())
    }

    /// Handle that does not keep the instance alive.
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }

    /// Address of the shared instance; stable for as long as it lives.
    #[inline]
    pub fn as_ptr(&self) -> *const Instance {
        Arc::as_ptr(&self.0)
    }

    /// Number of live handles to this instance, `self` included.
    #[inline]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Whether both handles refer to the same instance.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.0.class, self.0.lease.scope())
    }
}

/// Non-owning back-reference from a scope to the instance that owns it.
#[derive(Clone, Default)]
pub struct WeakObjectRef(Weak<Instance>);

impl WeakObjectRef {
    /// The instance, if it is still alive.
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(object) => write!(f, "WeakObjectRef({object:?})"),
            None => write!(f, "WeakObjectRef(<dropped>)"),
        }
    }
}
