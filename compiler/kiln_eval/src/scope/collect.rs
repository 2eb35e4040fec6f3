//! Reclaiming instance scopes kept alive only by reference cycles.
//!
//! An inner instance holds its enclosing instance, and a field of the
//! enclosing instance may hold the inner one: `Outer() { made = new Inner(); }`
//! leaves `Outer` and `Inner` holding each other, so neither lease ever drops.
//! Collection is a mark-sweep over the live instances:
//!
//! 1. **Roots**: a handle to an instance is *internal* when it sits in a field
//!    of a local instance scope or is some instance's enclosing link; every
//!    other handle (host code, call contexts, frame and plain scopes) is
//!    external. An instance with more handles than internal ones is a root.
//! 2. **Mark**: everything reachable from a root through fields and enclosing
//!    links stays.
//! 3. **Sweep**: the fields of every unmarked instance are cleared. That
//!    breaks each cycle; dropping the cleared values then releases the scopes
//!    through their leases.
//!
//! The bindings of every instance scope stay write-locked from counting to
//! sweeping, so no field changes hands while handles are counted. An instance
//! scope is only reachable through a handle to its instance; hosts that keep
//! a bare `ScopeId` of an instance scope must keep the instance too.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use kiln_value::{Instance, ObjectRef, Value};
use parking_lot::RwLockWriteGuard;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::{Bindings, ScopeArena, ScopeNode};

/// Outcome of one collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Live instances with a local scope.
    pub candidates: usize,
    /// Instances reachable from outside the instance graph.
    pub marked: usize,
    /// Instances whose fields were cleared.
    pub swept: usize,
}

/// A live instance and its write-locked fields.
struct Candidate<'a> {
    object: &'a ObjectRef,
    fields: RwLockWriteGuard<'a, FxHashMap<String, Value>>,
}

impl ScopeArena {
    /// Run a collection now, waiting for one already in progress to finish.
    pub fn collect_cycles(&self) -> CollectStats {
        let _collecting = self.collecting.lock();
        self.bound_since_collect.store(0, Ordering::Relaxed);
        self.collect()
    }

    /// Collect automatically every `threshold` bound instances; `None`
    /// leaves collection to explicit `collect_cycles` calls.
    pub fn set_collect_threshold(&self, threshold: Option<usize>) {
        self.collect_threshold
            .store(threshold.unwrap_or(0), Ordering::Relaxed);
    }

    /// Count one newly bound instance, collecting once the threshold is
    /// reached. Skipped while another thread is collecting.
    pub(super) fn note_instance(&self) {
        let threshold = self.collect_threshold.load(Ordering::Relaxed);
        if threshold == 0 {
            return;
        }
        let bound = self.bound_since_collect.fetch_add(1, Ordering::Relaxed) + 1;
        if bound < threshold {
            return;
        }
        if let Some(_collecting) = self.collecting.try_lock() {
            self.bound_since_collect.store(0, Ordering::Relaxed);
            self.collect();
        }
    }

    fn collect(&self) -> CollectStats {
        // One handle per instance, taken here; accounted for below.
        let nodes = self.instance_nodes();

        let (stats, swept) = {
            let mut candidates: Vec<Candidate<'_>> = nodes
                .iter()
                .filter_map(|(node, object)| match &node.bindings {
                    Bindings::Local(map) => Some(Candidate {
                        object,
                        fields: map.write(),
                    }),
                    Bindings::External(_) => None,
                })
                .collect();
            let marked = mark(&candidates);

            let mut swept = Vec::new();
            for (candidate, live) in candidates.iter_mut().zip(&marked) {
                if !live {
                    swept.push(std::mem::take(&mut *candidate.fields));
                }
            }
            let stats = CollectStats {
                candidates: candidates.len(),
                marked: marked.iter().filter(|live| **live).count(),
                swept: swept.len(),
            };
            (stats, swept)
        };

        // Locks are released; dropping the cleared fields may release scopes.
        drop(swept);
        drop(nodes);
        debug!(
            candidates = stats.candidates,
            marked = stats.marked,
            swept = stats.swept,
            "collected instance cycles"
        );
        stats
    }

    /// Every allocated scope with a live owner, in slot order.
    fn instance_nodes(&self) -> Vec<(Arc<ScopeNode>, ObjectRef)> {
        self.slots
            .read()
            .iter()
            .filter_map(|slot| slot.node.as_ref())
            .filter_map(|node| node.owner().map(|owner| (Arc::clone(node), owner)))
            .collect()
    }
}

/// Which candidates are reachable from a root.
fn mark(candidates: &[Candidate<'_>]) -> Vec<bool> {
    let index: FxHashMap<*const Instance, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| (candidate.object.as_ptr(), i))
        .collect();

    let mut internal = vec![0_usize; candidates.len()];
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); candidates.len()];
    for (i, candidate) in candidates.iter().enumerate() {
        let held = candidate
            .fields
            .values()
            .filter_map(Value::as_object)
            .chain(candidate.object.enclosing());
        for target in held {
            if let Some(&j) = index.get(&target.as_ptr()) {
                internal[j] += 1;
                edges[i].push(j);
            }
        }
    }

    // The collector's own handle is the `+ 1`.
    let mut work_stack: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(i, candidate)| candidate.object.strong_count() > internal[*i] + 1)
        .map(|(i, _)| i)
        .collect();

    let mut marked = vec![false; candidates.len()];
    while let Some(i) = work_stack.pop() {
        if marked[i] {
            continue;
        }
        marked[i] = true;
        work_stack.extend(edges[i].iter().copied().filter(|&j| !marked[j]));
    }
    marked
}
