//! Scope chain storage.
//!
//! Every scope lives in a single `ScopeArena` and is addressed by a
//! generational `ScopeId`. A scope records its parent by id, so the chain is
//! a plain parent walk and no scope ever holds another scope alive. Instances
//! own their scope through a `ScopeLease`; frame scopes are owned by a
//! `ScopeGuard`. Releasing a scope bumps its slot generation, so any stale id
//! fails with a released-scope error instead of reading a recycled slot.
//!
//! # Locking
//!
//! The slot table and each scope's bindings have separate locks. The table
//! lock is only held long enough to clone the node's `Arc`; binding locks are
//! taken afterwards, so no code path ever holds both.
//!
//! # Cycles
//!
//! Leases are reference counted, so instances holding each other through
//! fields never drop on their own. The arena collects such cycles every
//! `collect_threshold` bound instances and on `collect_cycles`; see
//! `collect.rs`.

mod collect;
mod external;

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, OnceLock, Weak};

use kiln_ir::ScopeId;
use kiln_value::{
    released_scope, undeclared_assignment, undefined_variable, EvalError, EvalResult, ObjectRef,
    ReleaseScope, ScopeLease, Value, WeakObjectRef,
};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::AssignPolicy;
use external::ExternalBindings;

pub use collect::CollectStats;
pub use external::{ExternalStore, MapStore, SharedStore, StoreError};

/// Name that resolves to the nearest scope owner when nothing shadows it.
pub const THIS: &str = "this";

/// Where a scope keeps its bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Bindings in an interpreter-owned map.
    Local,
    /// Bindings read from and written to a host `ExternalStore`.
    ExternalBacked,
}

enum Bindings {
    Local(RwLock<FxHashMap<String, Value>>),
    External(ExternalBindings),
}

/// One scope: bindings, parent link and (for instance scopes) the owner.
pub struct ScopeNode {
    label: String,
    parent: Option<ScopeId>,
    owner: OnceLock<WeakObjectRef>,
    bindings: Bindings,
}

impl ScopeNode {
    fn local(label: &str, parent: Option<ScopeId>) -> Self {
        ScopeNode {
            label: label.to_string(),
            parent,
            owner: OnceLock::new(),
            bindings: Bindings::Local(RwLock::new(FxHashMap::default())),
        }
    }

    fn external(label: &str, parent: Option<ScopeId>, store: SharedStore) -> Self {
        ScopeNode {
            label: label.to_string(),
            parent,
            owner: OnceLock::new(),
            bindings: Bindings::External(ExternalBindings::new(store)),
        }
    }

    /// Diagnostic label given at allocation.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enclosing scope, `None` for a root.
    #[inline]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Where the bindings live.
    pub fn kind(&self) -> ScopeKind {
        match self.bindings {
            Bindings::Local(_) => ScopeKind::Local,
            Bindings::External(_) => ScopeKind::ExternalBacked,
        }
    }

    /// The instance this scope belongs to, while it is still alive.
    pub fn owner(&self) -> Option<ObjectRef> {
        self.owner.get().and_then(WeakObjectRef::upgrade)
    }

    fn read(&self, name: &str) -> Option<Value> {
        match &self.bindings {
            Bindings::Local(map) => map.read().get(name).cloned(),
            Bindings::External(external) => external.read(name),
        }
    }

    fn write(&self, name: &str, value: Value) -> Result<(), EvalError> {
        match &self.bindings {
            Bindings::Local(map) => {
                // Dropped after the lock: releasing an instance re-enters the arena.
                let _previous = map.write().insert(name.to_string(), value);
                Ok(())
            }
            Bindings::External(external) => external.write(name, value),
        }
    }

    /// Overwrite `name` only if it is bound in this scope. The check and the
    /// write happen under one lock.
    fn replace_if_bound(&self, name: &str, value: Value) -> Result<bool, EvalError> {
        match &self.bindings {
            Bindings::Local(map) => {
                let previous = map
                    .write()
                    .get_mut(name)
                    .map(|slot| std::mem::replace(slot, value));
                Ok(previous.is_some())
            }
            Bindings::External(external) => external.replace_if_bound(name, value),
        }
    }

    /// Whether `name` is bound in this scope itself.
    pub fn contains(&self, name: &str) -> bool {
        match &self.bindings {
            Bindings::Local(map) => map.read().contains_key(name),
            Bindings::External(external) => external.contains(name),
        }
    }

    /// Names bound directly in this scope, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = match &self.bindings {
            Bindings::Local(map) => map.read().keys().cloned().collect(),
            Bindings::External(external) => external.names(),
        };
        names.sort_unstable();
        names
    }
}

struct Slot {
    generation: u32,
    node: Option<Arc<ScopeNode>>,
}

/// Generational arena holding every scope of one interpreter.
pub struct ScopeArena {
    slots: RwLock<Vec<Slot>>,
    free: Mutex<Vec<u32>>,
    this_arena: Weak<ScopeArena>,
    /// Held for the duration of a cycle collection.
    collecting: Mutex<()>,
    /// Bound instances between automatic collections; `0` disables them.
    collect_threshold: AtomicUsize,
    bound_since_collect: AtomicUsize,
}

impl ScopeArena {
    /// Arena whose first slot already holds a parentless root scope.
    ///
    /// Automatic cycle collection starts disabled.
    pub fn with_root(label: &str) -> (Arc<Self>, ScopeId) {
        let arena = Arc::new_cyclic(|this_arena| ScopeArena {
            slots: RwLock::new(vec![Slot {
                generation: 0,
                node: Some(Arc::new(ScopeNode::local(label, None))),
            }]),
            free: Mutex::new(Vec::new()),
            this_arena: this_arena.clone(),
            collecting: Mutex::new(()),
            collect_threshold: AtomicUsize::new(0),
            bound_since_collect: AtomicUsize::new(0),
        });
        (arena, ScopeId::new(0, 0))
    }

    /// Allocate an empty local scope under `parent`.
    pub fn alloc(&self, label: &str, parent: Option<ScopeId>) -> Result<ScopeId, EvalError> {
        self.check_parent(parent)?;
        self.insert(ScopeNode::local(label, parent))
    }

    /// Allocate a scope whose bindings live in `store`.
    pub fn alloc_external(
        &self,
        label: &str,
        parent: Option<ScopeId>,
        store: SharedStore,
    ) -> Result<ScopeId, EvalError> {
        self.check_parent(parent)?;
        self.insert(ScopeNode::external(label, parent, store))
    }

    fn check_parent(&self, parent: Option<ScopeId>) -> Result<(), EvalError> {
        match parent {
            Some(parent) if !self.is_live(parent) => Err(released_scope(parent)),
            _ => Ok(()),
        }
    }

    fn insert(&self, node: ScopeNode) -> Result<ScopeId, EvalError> {
        let label = node.label.clone();
        let node = Some(Arc::new(node));
        let mut slots = self.slots.write();
        let id = if let Some(index) = self.free.lock().pop() {
            let slot = &mut slots[index as usize];
            slot.node = node;
            ScopeId::new(index, slot.generation)
        } else {
            let index = u32::try_from(slots.len())
                .map_err(|_| EvalError::new("scope arena exhausted"))?;
            slots.push(Slot {
                generation: 0,
                node,
            });
            ScopeId::new(index, 0)
        };
        trace!(scope = %id, label = %label, "allocated scope");
        Ok(id)
    }

    /// Free `scope`. Returns `false` if it was already released.
    ///
    /// Children are not released with it; any later access through them
    /// fails once the walk reaches the released parent.
    pub fn release(&self, scope: ScopeId) -> bool {
        let released = {
            let mut slots = self.slots.write();
            match slots.get_mut(scope.index()) {
                Some(slot) if slot.generation == scope.generation() && slot.node.is_some() => {
                    slot.generation = slot.generation.wrapping_add(1);
                    slot.node.take()
                }
                _ => None,
            }
        };
        match released {
            Some(node) => {
                self.free.lock().push(scope.slot());
                trace!(scope = %scope, label = %node.label, "released scope");
                true
            }
            None => false,
        }
    }

    /// The live node behind `scope`.
    pub fn node(&self, scope: ScopeId) -> Result<Arc<ScopeNode>, EvalError> {
        self.slots
            .read()
            .get(scope.index())
            .filter(|slot| slot.generation == scope.generation())
            .and_then(|slot| slot.node.clone())
            .ok_or_else(|| released_scope(scope))
    }

    /// Whether `scope` is still allocated under this generation.
    pub fn is_live(&self, scope: ScopeId) -> bool {
        self.node(scope).is_ok()
    }

    /// Number of scopes currently allocated.
    pub fn live_count(&self) -> usize {
        self.slots
            .read()
            .iter()
            .filter(|slot| slot.node.is_some())
            .count()
    }

    /// Parent of a live scope.
    pub fn parent(&self, scope: ScopeId) -> Result<Option<ScopeId>, EvalError> {
        Ok(self.node(scope)?.parent())
    }

    /// Kind of a live scope.
    pub fn kind(&self, scope: ScopeId) -> Result<ScopeKind, EvalError> {
        Ok(self.node(scope)?.kind())
    }

    /// Resolve `name` along the chain, or fail with an undefined-variable
    /// error.
    pub fn get(&self, scope: ScopeId, name: &str) -> EvalResult {
        self.lookup(scope, name)?
            .ok_or_else(|| undefined_variable(name))
    }

    /// Resolve `name` along the chain starting at `scope`.
    ///
    /// The nearest binding wins. `this` falls back to the nearest scope
    /// owner when no scope binds it explicitly.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Result<Option<Value>, EvalError> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = self.node(id)?;
            if let Some(value) = node.read(name) {
                return Ok(Some(value));
            }
            if name == THIS {
                if let Some(owner) = node.owner() {
                    return Ok(Some(Value::Object(owner)));
                }
            }
            current = node.parent();
        }
        Ok(None)
    }

    /// Bind `name` in `scope` itself, shadowing any outer binding.
    pub fn declare_local(&self, scope: ScopeId, name: &str, value: Value) -> Result<(), EvalError> {
        self.node(scope)?.write(name, value)
    }

    /// Assign to the nearest scope that already binds `name`.
    ///
    /// Returns the scope that was written. When nothing binds the name,
    /// `policy` decides between declaring it in `scope` and failing.
    pub fn set_existing(
        &self,
        scope: ScopeId,
        name: &str,
        value: Value,
        policy: AssignPolicy,
    ) -> Result<ScopeId, EvalError> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = self.node(id)?;
            if node.replace_if_bound(name, value.clone())? {
                return Ok(id);
            }
            current = node.parent();
        }
        match policy {
            AssignPolicy::DeclareLocal => {
                debug!(name, scope = %scope, "assignment declares a new local");
                self.declare_local(scope, name, value)?;
                Ok(scope)
            }
            AssignPolicy::Reject => Err(undeclared_assignment(name)),
        }
    }

    /// Whether `name` is bound directly in `scope`.
    pub fn contains_local(&self, scope: ScopeId, name: &str) -> Result<bool, EvalError> {
        Ok(self.node(scope)?.contains(name))
    }

    /// Record `owner` as the instance owning `scope`. A scope is owned at
    /// most once.
    ///
    /// Counts towards the automatic cycle-collection threshold, so a
    /// collection may run before this returns.
    pub fn bind_owner(&self, scope: ScopeId, owner: &ObjectRef) -> Result<(), EvalError> {
        self.node(scope)?
            .owner
            .set(owner.downgrade())
            .map_err(|_| EvalError::new(format!("{scope} already has an owner")))?;
        self.note_instance();
        Ok(())
    }

    /// The live instance owning `scope`, if any.
    pub fn owner(&self, scope: ScopeId) -> Result<Option<ObjectRef>, EvalError> {
        Ok(self.node(scope)?.owner())
    }

    /// Live owners along the chain, nearest first.
    pub fn owners(&self, scope: ScopeId) -> Result<Vec<ObjectRef>, EvalError> {
        let mut owners = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = self.node(id)?;
            owners.extend(node.owner());
            current = node.parent();
        }
        Ok(owners)
    }

    /// A lease that releases `scope` when the last holder drops it.
    pub fn lease(&self, scope: ScopeId) -> ScopeLease {
        let arena: Weak<dyn ReleaseScope> = self.this_arena.clone();
        ScopeLease::new(scope, arena)
    }
}

impl ReleaseScope for ScopeArena {
    fn release(&self, scope: ScopeId) {
        ScopeArena::release(self, scope);
    }
}

/// RAII guard releasing a frame scope when the frame ends, including on
/// early return through `?`.
pub struct ScopeGuard<'a> {
    arena: &'a ScopeArena,
    scope: ScopeId,
}

impl<'a> ScopeGuard<'a> {
    /// Take ownership of `scope`, which must not be owned by anything else.
    pub fn new(arena: &'a ScopeArena, scope: ScopeId) -> Self {
        ScopeGuard { arena, scope }
    }

    /// The guarded scope.
    #[inline]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.arena.release(self.scope);
    }
}
