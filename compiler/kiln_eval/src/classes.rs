//! Class definitions and the registry the construction coordinator reads.
//!
//! Bodies (constructors and methods) are host closures over a
//! [`CallContext`]: evaluating statements is the caller's business, the
//! interpreter only owns scoping, enclosing instances and error routing.

use std::fmt;
use std::sync::Arc;

use kiln_ir::{ClassPath, ScopeId};
use kiln_value::{EvalResult, Value};
use rustc_hash::FxHashMap;

use crate::interpreter::CallContext;
use crate::shared::SharedMutableRegistry;

/// Executable body of a constructor or method.
pub type Body = Arc<dyn Fn(&mut CallContext<'_>) -> EvalResult + Send + Sync>;

/// Parameter list plus body.
#[derive(Clone)]
pub struct Callable {
    params: Vec<String>,
    body: Body,
}

impl Callable {
    /// Body taking the named parameters, in order.
    pub fn new<F>(params: &[&str], body: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> EvalResult + Send + Sync + 'static,
    {
        Callable {
            params: params.iter().map(ToString::to_string).collect(),
            body: Arc::new(body),
        }
    }

    /// Parameter names, in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.params.join(", "))
    }
}

/// How a class relates to the class it is declared in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Nesting {
    TopLevel,
    /// Declared `static` inside `outer`: needs no enclosing instance.
    Static { outer: ClassPath },
    /// Declared inside `outer` without `static`: every instance is bound to
    /// an instance of `outer`.
    Instance { outer: ClassPath },
}

/// A script class.
#[derive(Clone, Debug)]
pub struct ClassDef {
    path: ClassPath,
    nesting: Nesting,
    fields: Vec<(String, Value)>,
    constructor: Option<Callable>,
    methods: FxHashMap<String, Callable>,
    static_methods: FxHashMap<String, Callable>,
    defining_scope: Option<ScopeId>,
}

impl ClassDef {
    fn with_nesting(path: ClassPath, nesting: Nesting) -> Self {
        ClassDef {
            path,
            nesting,
            fields: Vec::new(),
            constructor: None,
            methods: FxHashMap::default(),
            static_methods: FxHashMap::default(),
            defining_scope: None,
        }
    }

    /// Class not nested in any other class.
    pub fn top_level(path: impl Into<ClassPath>) -> Self {
        ClassDef::with_nesting(path.into(), Nesting::TopLevel)
    }

    /// Instance-nested class `name` declared inside `outer`.
    pub fn inner_of(outer: &ClassPath, name: &str) -> Self {
        ClassDef::with_nesting(
            outer.child(name),
            Nesting::Instance {
                outer: outer.clone(),
            },
        )
    }

    /// Static nested class `name` declared inside `outer`.
    pub fn static_of(outer: &ClassPath, name: &str) -> Self {
        ClassDef::with_nesting(
            outer.child(name),
            Nesting::Static {
                outer: outer.clone(),
            },
        )
    }

    /// Declare a field initialized to `init` in every new instance.
    #[must_use]
    pub fn field(mut self, name: &str, init: Value) -> Self {
        self.fields.push((name.to_string(), init));
        self
    }

    /// Set the constructor; without one, construction only initializes fields.
    #[must_use]
    pub fn constructor<F>(mut self, params: &[&str], body: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> EvalResult + Send + Sync + 'static,
    {
        self.constructor = Some(Callable::new(params, body));
        self
    }

    /// Add an instance method, run with `this` bound to the receiver.
    #[must_use]
    pub fn method<F>(mut self, name: &str, params: &[&str], body: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> EvalResult + Send + Sync + 'static,
    {
        self.methods
            .insert(name.to_string(), Callable::new(params, body));
        self
    }

    /// Add a method reachable as `Class.name(args)` without an instance.
    #[must_use]
    pub fn static_method<F>(mut self, name: &str, params: &[&str], body: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> EvalResult + Send + Sync + 'static,
    {
        self.static_methods
            .insert(name.to_string(), Callable::new(params, body));
        self
    }

    /// Scope the class was declared in. Instances with no enclosing instance
    /// chain their scope to it; without one they chain to the global scope.
    #[must_use]
    pub fn defined_in(mut self, scope: ScopeId) -> Self {
        self.defining_scope = Some(scope);
        self
    }

    pub fn path(&self) -> &ClassPath {
        &self.path
    }

    /// How the class is nested in its outer class, if at all.
    pub fn nesting(&self) -> &Nesting {
        &self.nesting
    }

    /// Declaring class, for nested classes.
    pub fn outer(&self) -> Option<&ClassPath> {
        match &self.nesting {
            Nesting::TopLevel => None,
            Nesting::Static { outer } | Nesting::Instance { outer } => Some(outer),
        }
    }

    /// Whether instances need an enclosing instance of the outer class.
    #[inline]
    pub fn is_instance_nested(&self) -> bool {
        matches!(self.nesting, Nesting::Instance { .. })
    }

    /// Declared fields with their initial values.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn ctor(&self) -> Option<&Callable> {
        self.constructor.as_ref()
    }

    pub fn find_method(&self, name: &str) -> Option<&Callable> {
        self.methods.get(name)
    }

    pub fn find_static_method(&self, name: &str) -> Option<&Callable> {
        self.static_methods.get(name)
    }

    /// Scope the class was declared in; the parent of instance scopes that
    /// have no enclosing instance.
    pub fn defining_scope(&self) -> Option<ScopeId> {
        self.defining_scope
    }
}

/// Read access to class definitions.
pub trait ClassRegistry: Send + Sync {
    fn lookup(&self, path: &ClassPath) -> Option<Arc<ClassDef>>;
}

/// Default registry: a shared table that can be extended after the
/// interpreter has been built (clones share the same table).
#[derive(Clone, Default)]
pub struct ClassTable {
    classes: SharedMutableRegistry<FxHashMap<ClassPath, Arc<ClassDef>>>,
}

impl ClassTable {
    /// Empty table.
    pub fn new() -> Self {
        ClassTable::default()
    }

    /// Register `class`, replacing any class with the same path.
    pub fn define(&self, class: ClassDef) -> Arc<ClassDef> {
        let class = Arc::new(class);
        self.classes
            .write()
            .insert(class.path().clone(), Arc::clone(&class));
        class
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl ClassRegistry for ClassTable {
    fn lookup(&self, path: &ClassPath) -> Option<Arc<ClassDef>> {
        self.classes.read().get(path).cloned()
    }
}

impl fmt::Debug for ClassTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes = self.classes.read();
        let mut paths: Vec<_> = classes.keys().map(ToString::to_string).collect();
        paths.sort_unstable();
        f.debug_tuple("ClassTable").field(&paths).finish()
    }
}
