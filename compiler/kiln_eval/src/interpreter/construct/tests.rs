use pretty_assertions::assert_eq;

use kiln_value::EvalErrorKind;

use crate::{ClassDef, ClassTable, Interpreter, Value};

use super::*;

fn interpreter(table: &ClassTable) -> Interpreter {
    Interpreter::builder().classes(table.clone()).build()
}

#[test]
fn arity_mismatch_allocates_nothing() {
    let table = ClassTable::new();
    table.define(ClassDef::top_level("Point").constructor(&["x", "y"], |_| Ok(Value::Void)));
    let interp = interpreter(&table);
    let before = interp.scopes().live_count();
    let mut ctx = interp.context(interp.global_scope());

    let err = ctx
        .construct(&ClassPath::from("Point"), vec![Value::int(1)])
        .expect_err("arity");
    assert_eq!(
        err.resolution_kind(),
        Some(&EvalErrorKind::ArityMismatch {
            name: "Point".to_string(),
            expected: 2,
            got: 1
        })
    );
    assert_eq!(interp.scopes().live_count(), before);
}

#[test]
fn class_without_constructor_takes_no_arguments() {
    let table = ClassTable::new();
    table.define(ClassDef::top_level("Empty"));
    let interp = interpreter(&table);
    let mut ctx = interp.context(interp.global_scope());

    assert!(ctx.construct(&ClassPath::from("Empty"), vec![]).is_ok());
    assert!(ctx
        .construct(&ClassPath::from("Empty"), vec![Value::Null])
        .is_err());
}

#[test]
fn fields_are_initialized_before_the_constructor_runs() {
    let table = ClassTable::new();
    table.define(
        ClassDef::top_level("Counter")
            .field("count", Value::int(10))
            .field("seen", Value::Null)
            .constructor(&[], |ctx| {
                let count = ctx.get("count")?;
                ctx.assign("seen", count)?;
                Ok(Value::Void)
            }),
    );
    let interp = interpreter(&table);
    let mut ctx = interp.context(interp.global_scope());

    let counter = ctx
        .construct(&ClassPath::from("Counter"), vec![])
        .expect("construct");
    assert_eq!(ctx.field(&counter, "seen").expect("seen"), Value::int(10));
}

#[test]
fn constructor_parameters_stay_in_the_frame() {
    let table = ClassTable::new();
    table.define(ClassDef::top_level("Box").constructor(&["content"], |_| Ok(Value::Void)));
    let interp = interpreter(&table);
    let before = interp.scopes().live_count();
    let mut ctx = interp.context(interp.global_scope());

    let boxed = ctx
        .construct(&ClassPath::from("Box"), vec![Value::int(1)])
        .expect("construct");
    assert!(ctx.field(&boxed, "content").is_err());
    // Only the instance scope outlives construction.
    assert_eq!(interp.scopes().live_count(), before + 1);

    drop(boxed);
    assert_eq!(interp.scopes().live_count(), before);
}

#[test]
fn instance_scope_chains_to_the_defining_scope() {
    let table = ClassTable::new();
    let interp = interpreter(&table);
    let module = interp.new_scope("module", None).expect("module");
    interp
        .declare_variable(module, "greeting", Value::string("hi"))
        .expect("declare");
    table.define(
        ClassDef::top_level("Greeter")
            .defined_in(module)
            .method("greet", &[], |ctx| ctx.get("greeting")),
    );
    let mut ctx = interp.context(interp.global_scope());

    let greeter = ctx
        .construct(&ClassPath::from("Greeter"), vec![])
        .expect("construct");
    assert_eq!(
        ctx.call_method(&greeter, "greet", vec![]).expect("greet"),
        Value::string("hi")
    );
    assert!(ctx.get("greeting").is_err());
}

#[test]
fn inner_instance_scope_chains_to_enclosing_instance() {
    let table = ClassTable::new();
    let outer = ClassPath::from("Outer");
    table.define(ClassDef::top_level("Outer").field("secret", Value::int(99)));
    table.define(
        ClassDef::inner_of(&outer, "Inner").method("peek", &[], |ctx| ctx.get("secret")),
    );
    let interp = interpreter(&table);
    let mut ctx = interp.context(interp.global_scope());

    let o = ctx.construct(&outer, vec![]).expect("outer");
    let inner = ctx
        .construct_qualified(&o, "Inner", vec![])
        .expect("inner");
    let inner_scope = inner.as_object().map(ObjectRef::scope).expect("object");
    let outer_scope = o.as_object().map(ObjectRef::scope).expect("object");

    assert_eq!(interp.scopes().parent(inner_scope).expect("live"), Some(outer_scope));
    assert_eq!(ctx.call_method(&inner, "peek", vec![]).expect("peek"), Value::int(99));
}

#[test]
fn static_method_wins_over_construction() {
    let table = ClassTable::new();
    let outer = ClassPath::from("Outer");
    table.define(
        ClassDef::top_level("Outer").static_method("make", &["n"], |ctx| ctx.get("n")),
    );
    table.define(ClassDef::static_of(&outer, "make"));
    let interp = interpreter(&table);
    let mut ctx = interp.context(interp.global_scope());

    let made = ctx
        .invoke_static(&ClassPath::from("Outer.make"), vec![Value::int(4)])
        .expect("static method");
    assert_eq!(made, Value::int(4));
}

#[test]
fn unbounded_self_construction_hits_the_depth_limit() {
    let table = ClassTable::new();
    table.define(ClassDef::top_level("Loop").constructor(&[], |ctx| {
        ctx.construct(&ClassPath::from("Loop"), vec![])
    }));
    let interp = Interpreter::builder()
        .classes(table)
        .max_call_depth(16)
        .build();
    let mut ctx = interp.context(interp.global_scope());

    let err = ctx
        .construct(&ClassPath::from("Loop"), vec![])
        .expect_err("overflow");
    assert_eq!(
        err.resolution_kind(),
        Some(&EvalErrorKind::StackOverflow { depth: 16 })
    );
    assert_eq!(err.backtrace.map(|b| b.len()), Some(16));
    assert_eq!(interp.scopes().live_count(), 1);
}

#[test]
fn this_inside_constructor_is_the_new_instance() {
    let table = ClassTable::new();
    table.define(ClassDef::top_level("Selfish").constructor(&[], |ctx| {
        let via_scope = ctx.get("this")?;
        let via_context = ctx.this().cloned().map(Value::Object).unwrap_or(Value::Null);
        ctx.set_field(&via_scope, "same", Value::Bool(via_scope == via_context))?;
        Ok(Value::Void)
    }));
    let interp = interpreter(&table);
    let mut ctx = interp.context(interp.global_scope());

    let object = ctx
        .construct(&ClassPath::from("Selfish"), vec![])
        .expect("construct");
    assert_eq!(ctx.field(&object, "same").expect("same"), Value::Bool(true));
}
