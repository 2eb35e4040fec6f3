//! Interpreter configuration.
//!
//! Policies are plain enums matched at the point of use, so adding a policy
//! forces every consumer to decide what it means.

/// What `assign_variable` does when no scope in the chain binds the name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AssignPolicy {
    /// Declare the variable in the scope the assignment originated from.
    #[default]
    DeclareLocal,
    /// Fail with an undeclared-assignment resolution error.
    Reject,
}

/// Settings fixed for the lifetime of an `Interpreter`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Handling of assignments to unbound names.
    pub assign_policy: AssignPolicy,
    /// Maximum nesting of constructor/method invocations, or `None` for
    /// unlimited (the native stack grows on demand).
    pub max_call_depth: Option<usize>,
    /// Diagnostic label of the global scope.
    pub global_label: String,
    /// Instances constructed between automatic collections of instance
    /// cycles, or `None` to collect only on `Interpreter::collect_cycles`.
    pub collect_threshold: Option<usize>,
}

/// Default `collect_threshold`.
pub const DEFAULT_COLLECT_THRESHOLD: usize = 1024;

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            assign_policy: AssignPolicy::default(),
            max_call_depth: None,
            global_label: "global".to_string(),
            collect_threshold: Some(DEFAULT_COLLECT_THRESHOLD),
        }
    }
}

impl InterpreterConfig {
    /// Strict settings: undeclared assignment fails and call depth is bounded.
    pub fn strict(max_call_depth: usize) -> Self {
        InterpreterConfig {
            assign_policy: AssignPolicy::Reject,
            max_call_depth: Some(max_call_depth),
            ..InterpreterConfig::default()
        }
    }
}
