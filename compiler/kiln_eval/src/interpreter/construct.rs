//! Object construction.
//!
//! Construction runs in a fixed order:
//!
//! 1. resolve the class and its enclosing instance
//! 2. check the constructor arity (nothing is allocated on mismatch)
//! 3. allocate the instance scope, chained to the enclosing instance's
//!    scope, else the class's defining scope, else the global scope
//! 4. bind the new instance as owner of that scope
//! 5. declare the fields with their initial values
//! 6. run the constructor body in a frame scope under the instance scope
//!
//! Resolution failures keep their kind; failures inside the constructor
//! body keep theirs. A failed construction drops the half-built instance,
//! which releases its scope.

use kiln_ir::ClassPath;
use kiln_value::{arity_mismatch, EvalResult, ObjectRef, Value};
use tracing::debug;

use crate::classes::Callable;
use crate::enclosing::{ConstructTarget, EnclosingResolver, Resolved};

use super::CallContext;

impl CallContext<'_> {
    /// `new path(args)`.
    pub fn construct(&mut self, path: &ClassPath, args: Vec<Value>) -> EvalResult {
        self.construct_target(ConstructTarget::Path(path), args)
    }

    /// `receiver.new member(args)`.
    pub fn construct_qualified(&mut self, receiver: &Value, member: &str, args: Vec<Value>) -> EvalResult {
        self.construct_target(ConstructTarget::Qualified { receiver, member }, args)
    }

    /// `Outer.Name(args)`: a static method `Name` of `Outer` if one exists,
    /// otherwise construction of the static class `Outer.Name`.
    pub fn invoke_static(&mut self, path: &ClassPath, args: Vec<Value>) -> EvalResult {
        let interp = self.interp;
        if let Some(outer) = path.outer() {
            if let Some(class) = interp.classes.lookup(&outer) {
                if let Some(method) = class.find_static_method(path.simple_name()) {
                    let parent = class.defining_scope().unwrap_or(interp.global);
                    return self.invoke(path.to_string(), method, parent, None, args);
                }
            }
        }
        self.construct_target(ConstructTarget::Static(path), args)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(site = %target))]
    fn construct_target(&mut self, target: ConstructTarget<'_>, args: Vec<Value>) -> EvalResult {
        let interp = self.interp;
        let Resolved { class, binding } = EnclosingResolver::new(&interp.scopes, &*interp.classes)
            .resolve(target, self.scope)
            .map_err(|err| self.locate(err))?;

        let expected = class.ctor().map_or(0, Callable::arity);
        if args.len() != expected {
            return Err(self.locate(arity_mismatch(class.path().simple_name(), expected, args.len())));
        }

        let parent = match &binding.instance {
            Some(enclosing) => enclosing.scope(),
            None => class.defining_scope().unwrap_or(interp.global),
        };
        let scope = interp
            .scopes
            .alloc(&class.path().to_string(), Some(parent))
            .map_err(|err| self.locate(err))?;
        let instance = ObjectRef::new(class.path().clone(), interp.scopes.lease(scope), binding.instance);
        interp
            .scopes
            .bind_owner(scope, &instance)
            .map_err(|err| self.locate(err))?;
        for (name, init) in class.fields() {
            interp
                .scopes
                .declare_local(scope, name, init.clone())
                .map_err(|err| self.locate(err))?;
        }

        if let Some(constructor) = class.ctor() {
            let frame_name = format!("{}.<init>", class.path());
            self.invoke(frame_name, constructor, scope, Some(instance.clone()), args)?;
        }
        debug!(class = %class.path(), scope = %scope, "constructed");
        Ok(Value::Object(instance))
    }
}

#[cfg(test)]
mod tests;
