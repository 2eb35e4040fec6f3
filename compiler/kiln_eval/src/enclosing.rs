//! Enclosing-instance resolution.
//!
//! Decides, for one construction site, which class is being constructed and
//! which live instance (if any) it must be bound to. Three syntactic forms
//! reach here:
//!
//! | Form                | Example                | Enclosing instance          |
//! |---------------------|------------------------|-----------------------------|
//! | `Path`              | `new Outer.Inner()`    | nearest ambient `this`      |
//! | `Qualified`         | `o.new Inner()`        | the receiver `o`, always    |
//! | `Static`            | `Outer.Inner()`        | never; static context       |
//!
//! An ambient `this` is any scope owner on the chain from the construction
//! site outward, or an instance those owners were themselves constructed
//! inside of. The explicit receiver of a qualified form always wins over
//! ambient instances.

use std::fmt;
use std::sync::Arc;

use kiln_ir::{ClassPath, ScopeId};
use kiln_value::{
    class_not_found, enclosing_instance_required, enclosing_mismatch, not_an_object,
    static_member_not_found, EvalError, EvalNote, ObjectRef, Value,
};
use tracing::debug;

use crate::classes::{ClassDef, ClassRegistry, Nesting};
use crate::scope::ScopeArena;

/// A construction site, as written.
#[derive(Clone, Copy, Debug)]
pub enum ConstructTarget<'a> {
    /// `new Outer.Inner(...)`, or `new Inner(...)` from inside `Outer`.
    Path(&'a ClassPath),
    /// `receiver.new Member(...)`.
    Qualified { receiver: &'a Value, member: &'a str },
    /// `Outer.Inner(...)`: a class-name path used like a static call.
    Static(&'a ClassPath),
}

impl fmt::Display for ConstructTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructTarget::Path(path) => write!(f, "new {path}"),
            ConstructTarget::Qualified { receiver, member } => {
                write!(f, "{}.new {member}", receiver.type_name())
            }
            ConstructTarget::Static(path) => write!(f, "{path}"),
        }
    }
}

/// Where an enclosing instance came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// Named by the construction site.
    Explicit,
    /// Found through `this` at the construction site.
    Ambient,
    None,
}

/// Outcome of enclosing-instance resolution.
#[derive(Clone, Debug)]
pub struct EnclosingBinding {
    /// Instance the new object is bound to; `None` for top-level and static
    /// nested classes.
    pub instance: Option<ObjectRef>,
    /// Fully qualified class being constructed.
    pub class: ClassPath,
    pub receiver: Receiver,
    /// Whether the site had no instance context at all.
    pub static_context: bool,
}

impl EnclosingBinding {
    fn unbound(class: &ClassPath, static_context: bool) -> Self {
        EnclosingBinding {
            instance: None,
            class: class.clone(),
            receiver: Receiver::None,
            static_context,
        }
    }

    fn bound(class: &ClassPath, instance: ObjectRef, receiver: Receiver) -> Self {
        EnclosingBinding {
            instance: Some(instance),
            class: class.clone(),
            receiver,
            static_context: false,
        }
    }
}

/// The class to construct plus its binding.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub class: Arc<ClassDef>,
    pub binding: EnclosingBinding,
}

/// Stateless resolver over one interpreter's scopes and classes.
pub struct EnclosingResolver<'a> {
    scopes: &'a ScopeArena,
    classes: &'a dyn ClassRegistry,
}

impl<'a> EnclosingResolver<'a> {
    /// Resolver reading scopes and classes; it never allocates.
    pub fn new(scopes: &'a ScopeArena, classes: &'a dyn ClassRegistry) -> Self {
        EnclosingResolver { scopes, classes }
    }

    /// Resolve `target` as seen from `scope`.
    ///
    /// # Errors
    ///
    /// Resolution errors only: an unknown class, an instance-nested class
    /// with no suitable enclosing instance, a static path reaching a
    /// non-static member, or a receiver that is not an object.
    #[tracing::instrument(level = "trace", skip_all, fields(scope = %scope))]
    pub fn resolve(&self, target: ConstructTarget<'_>, scope: ScopeId) -> Result<Resolved, EvalError> {
        let resolved = match target {
            ConstructTarget::Path(path) => self.resolve_path(path, scope),
            ConstructTarget::Qualified { receiver, member } => {
                self.resolve_qualified(receiver, member)
            }
            ConstructTarget::Static(path) => self.resolve_static(path),
        }?;
        debug!(
            site = %target,
            class = %resolved.binding.class,
            receiver = ?resolved.binding.receiver,
            enclosing = ?resolved.binding.instance,
            "resolved construction site"
        );
        Ok(resolved)
    }

    fn resolve_path(&self, path: &ClassPath, scope: ScopeId) -> Result<Resolved, EvalError> {
        let owners = self.scopes.owners(scope)?;
        let class = self.lookup_lexical(path, &owners)?;
        let binding = match class.nesting() {
            Nesting::Instance { outer } => {
                let instance = owners
                    .iter()
                    .find_map(|owner| instance_of(owner, outer))
                    .ok_or_else(|| {
                        enclosing_instance_required(class.path())
                            .with_note(qualified_new_hint(outer, class.path()))
                    })?;
                EnclosingBinding::bound(class.path(), instance, Receiver::Ambient)
            }
            Nesting::TopLevel | Nesting::Static { .. } => {
                EnclosingBinding::unbound(class.path(), owners.is_empty())
            }
        };
        Ok(Resolved { class, binding })
    }

    fn resolve_qualified(&self, receiver: &Value, member: &str) -> Result<Resolved, EvalError> {
        let object = receiver.as_object().ok_or_else(|| not_an_object(receiver))?;
        let path = object.class().join(&ClassPath::from(member));
        let class = self
            .classes
            .lookup(&path)
            .ok_or_else(|| class_not_found(&path))?;
        let binding = match class.nesting() {
            Nesting::Instance { outer } => {
                let instance = instance_of(object, outer)
                    .ok_or_else(|| enclosing_mismatch(class.path(), object.class()))?;
                EnclosingBinding::bound(class.path(), instance, Receiver::Explicit)
            }
            Nesting::TopLevel | Nesting::Static { .. } => {
                debug!(class = %class.path(), "receiver ignored for a static class");
                EnclosingBinding::unbound(class.path(), false)
            }
        };
        Ok(Resolved { class, binding })
    }

    fn resolve_static(&self, path: &ClassPath) -> Result<Resolved, EvalError> {
        let Some(outer) = path.outer() else {
            let class = self.lookup(path)?;
            if class.is_instance_nested() {
                return Err(enclosing_instance_required(class.path()));
            }
            let binding = EnclosingBinding::unbound(class.path(), true);
            return Ok(Resolved { class, binding });
        };
        let not_static = || static_member_not_found(path.simple_name(), &outer);
        let class = self.classes.lookup(path).ok_or_else(not_static)?;
        if class.is_instance_nested() {
            return Err(not_static().with_note(qualified_new_hint(&outer, class.path())));
        }
        let binding = EnclosingBinding::unbound(class.path(), true);
        Ok(Resolved { class, binding })
    }

    fn lookup(&self, path: &ClassPath) -> Result<Arc<ClassDef>, EvalError> {
        self.classes
            .lookup(path)
            .ok_or_else(|| class_not_found(path))
    }

    /// Look `path` up relative to the classes of the ambient instances (and
    /// their declaring classes, innermost first), then as an absolute path.
    fn lookup_lexical(&self, path: &ClassPath, owners: &[ObjectRef]) -> Result<Arc<ClassDef>, EvalError> {
        for owner in owners {
            let mut context = Some(owner.class().clone());
            while let Some(class) = context {
                if let Some(found) = self.classes.lookup(&class.join(path)) {
                    return Ok(found);
                }
                context = class.outer();
            }
        }
        self.lookup(path)
    }
}

fn qualified_new_hint(outer: &ClassPath, class: &ClassPath) -> EvalNote {
    EvalNote::new(format!(
        "{class} is an inner class of {outer}; construct it through an instance, \
         e.g. `outer.new {}()`",
        class.simple_name()
    ))
}

/// `object` itself or the first instance it is nested within whose class is
/// `class`.
fn instance_of(object: &ObjectRef, class: &ClassPath) -> Option<ObjectRef> {
    object
        .enclosing_chain()
        .find(|candidate| candidate.class() == class)
        .cloned()
}

#[cfg(test)]
mod tests;
