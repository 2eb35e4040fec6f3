//! Scenario tests that drive the public interpreter surface end to end.

mod target_error_tests;

use crate::{ClassDef, ClassTable, Interpreter, Value};
use kiln_ir::ClassPath;

/// `Value::Object` of a result, for chaining calls in tests.
fn object(value: &Value) -> Value {
    assert!(value.as_object().is_some(), "expected an object, got {value}");
    value.clone()
}

/// ```text
/// class Outer {
///     Inner made;
///     class Inner {
///         int a;
///         Inner(a) { this.a = a; }
///         go() { return this.a; }
///     }
///     static class InStatic { go() { return 2; } }
///     Outer() { made = new Inner(1); }
///     go() { return new Inner(7); }
/// }
/// ```
fn outer_classes() -> ClassTable {
    let table = ClassTable::new();
    let outer = ClassPath::from("Outer");

    table.define(
        ClassDef::top_level("Outer")
            .field("made", Value::Null)
            .constructor(&[], |ctx| {
                let inner = ctx.construct(&ClassPath::from("Inner"), vec![Value::int(1)])?;
                ctx.assign("made", inner)?;
                Ok(Value::Void)
            })
            .method("go", &[], |ctx| {
                ctx.construct(&ClassPath::from("Inner"), vec![Value::int(7)])
            }),
    );
    table.define(
        ClassDef::inner_of(&outer, "Inner")
            .field("a", Value::int(0))
            .constructor(&["a"], |ctx| {
                let this = ctx.get("this")?;
                let a = ctx.get("a")?;
                ctx.set_field(&this, "a", a)?;
                Ok(Value::Void)
            })
            .method("go", &[], |ctx| {
                let this = ctx.get("this")?;
                ctx.field(&this, "a")
            }),
    );
    table.define(
        ClassDef::static_of(&outer, "InStatic").method("go", &[], |_| Ok(Value::int(2))),
    );
    table
}

fn interpreter_with(classes: &ClassTable) -> Interpreter {
    Interpreter::builder().classes(classes.clone()).build()
}
