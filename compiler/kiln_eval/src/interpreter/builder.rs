//! `InterpreterBuilder` for creating interpreters with various configurations.

use std::sync::Arc;

use crate::classes::{ClassRegistry, ClassTable};
use crate::config::{AssignPolicy, InterpreterConfig};
use crate::host::{HostBridge, HostFunctions};
use crate::scope::ScopeArena;
use crate::shared::SharedRegistry;

use super::Interpreter;

/// Builder for [`Interpreter`].
///
/// Without explicit registries the interpreter gets an empty `ClassTable`
/// and a host bridge with nothing registered.
#[derive(Default)]
pub struct InterpreterBuilder {
    classes: Option<SharedRegistry<dyn ClassRegistry>>,
    host: Option<SharedRegistry<dyn HostBridge>>,
    config: InterpreterConfig,
}

impl InterpreterBuilder {
    /// Builder with the default configuration.
    pub fn new() -> Self {
        InterpreterBuilder::default()
    }

    /// Set the class registry. A `ClassTable` clone kept by the caller can
    /// still define classes afterwards.
    #[must_use]
    pub fn classes(mut self, registry: impl ClassRegistry + 'static) -> Self {
        let registry: Arc<dyn ClassRegistry> = Arc::new(registry);
        self.classes = Some(SharedRegistry::from_arc(registry));
        self
    }

    /// Set the bridge `call_native` dispatches to.
    #[must_use]
    pub fn host(mut self, bridge: impl HostBridge + 'static) -> Self {
        let bridge: Arc<dyn HostBridge> = Arc::new(bridge);
        self.host = Some(SharedRegistry::from_arc(bridge));
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how assignment to an unbound name behaves.
    #[must_use]
    pub fn assign_policy(mut self, policy: AssignPolicy) -> Self {
        self.config.assign_policy = policy;
        self
    }

    /// Bound the nesting of body invocations.
    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.config.max_call_depth = Some(depth);
        self
    }

    /// Collect instance cycles after every `threshold` constructions;
    /// `0` leaves collection to explicit `collect_cycles` calls.
    #[must_use]
    pub fn collect_threshold(mut self, threshold: usize) -> Self {
        self.config.collect_threshold = (threshold > 0).then_some(threshold);
        self
    }

    /// Build the interpreter with a fresh arena and global scope.
    pub fn build(self) -> Interpreter {
        let (scopes, global) = ScopeArena::with_root(&self.config.global_label);
        scopes.set_collect_threshold(self.config.collect_threshold);
        let classes = self.classes.unwrap_or_else(|| {
            let table: Arc<dyn ClassRegistry> = Arc::new(ClassTable::new());
            SharedRegistry::from_arc(table)
        });
        let host = self.host.unwrap_or_else(|| {
            let bridge: Arc<dyn HostBridge> = Arc::new(HostFunctions::new());
            SharedRegistry::from_arc(bridge)
        });
        tracing::debug!(config = ?self.config, "built interpreter");
        Interpreter {
            scopes,
            classes,
            host,
            config: self.config,
            global,
        }
    }
}
