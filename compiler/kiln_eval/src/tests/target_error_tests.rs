use pretty_assertions::assert_eq;

use super::{interpreter_with, outer_classes};
use crate::{
    ClassDef, ClassTable, EvalErrorKind, HostFunctions, Interpreter, Throwable, TraceFrame, Value,
};
use kiln_ir::{ClassPath, Span};

fn failing_host() -> HostFunctions {
    HostFunctions::new()
        .register("io.read", |_| {
            let real = Throwable::new("IOException", "read failed")
                .with_trace(vec![
                    TraceFrame::new("host.io.Stream", "read").at("Stream.java:10"),
                    TraceFrame::new("host.reflect.Method", "invoke"),
                ])
                .into_ref();
            Err(Throwable::invocation_wrapper(real).into_ref())
        })
        .register("math.add", |args| {
            let sum = args.iter().filter_map(Value::as_int).sum::<i64>();
            Ok(Value::int(sum))
        })
}

/// `Reader` calls the failing host function from its constructor.
fn reader_classes() -> ClassTable {
    let table = ClassTable::new();
    table.define(ClassDef::top_level("Reader").constructor(&[], |ctx| {
        ctx.at(Span::new(20, 29));
        ctx.call_native("io.read", &[])
    }));
    table.define(ClassDef::top_level("Wrapper").constructor(&[], |ctx| {
        ctx.at(Span::new(3, 15));
        ctx.construct(&ClassPath::from("Reader"), vec![])
    }));
    table
}

#[test]
fn native_call_returns_host_value() {
    let interp = Interpreter::builder().host(failing_host()).build();
    let mut ctx = interp.context(interp.global_scope());

    let sum = ctx
        .call_native("math.add", &[Value::int(2), Value::int(3)])
        .expect("host call");
    assert_eq!(sum, Value::int(5));
}

#[test]
fn unknown_host_target_is_a_resolution_error() {
    let interp = Interpreter::builder().build();
    let mut ctx = interp.context(interp.global_scope());

    let err = ctx.call_native("nope", &[]).expect_err("unresolved");
    assert_eq!(
        err.resolution_kind(),
        Some(&EvalErrorKind::UndefinedMethod {
            method: "nope".to_string(),
            class: "host".to_string()
        })
    );
}

#[test]
fn host_exception_in_constructor_stays_catchable() {
    let interp = Interpreter::builder()
        .classes(reader_classes())
        .host(failing_host())
        .build();
    let mut ctx = interp.context(interp.global_scope());

    let err = ctx
        .construct(&ClassPath::from("Wrapper"), vec![])
        .expect_err("reader throws");
    let target = err.as_target().expect("host exceptions are target errors");

    assert!(target.in_native_code());
    assert!(target.cause().is_invocation_wrapper());
    assert_eq!(target.target().class_name(), "IOException");
    assert_eq!(err.span, Some(Span::new(20, 29)));

    let frames: Vec<&str> = err
        .backtrace
        .as_ref()
        .map(|b| b.frames().iter().map(|f| f.name.as_str()).collect())
        .unwrap_or_default();
    assert_eq!(frames, vec!["Reader.<init>", "Wrapper.<init>"]);
}

#[test]
fn host_exception_message_and_trace() {
    let interp = Interpreter::builder()
        .classes(reader_classes())
        .host(failing_host())
        .build();
    let mut ctx = interp.context(interp.global_scope());
    let err = ctx
        .construct(&ClassPath::from("Reader"), vec![])
        .expect_err("reader throws");

    assert_eq!(
        err.to_string(),
        "TargetError at 20..29\n\
         Caused by: reflect.InvocationTargetException\n\
         IOException: read failed"
    );

    let mut out = Vec::new();
    err.write_stack_trace(false, &mut out).expect("write");
    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "        at host.io.Stream.read(Stream.java:10)\n"
    );
}

#[test]
fn catch_target_sees_unwrapped_exception() {
    let interp = Interpreter::builder()
        .classes(reader_classes())
        .host(failing_host())
        .build();
    let mut ctx = interp.context(interp.global_scope());

    let caught = ctx
        .catch_target(|ctx| ctx.construct(&ClassPath::from("Wrapper"), vec![]))
        .expect("target errors are caught");
    let exception = caught.expect_err("constructor threw");

    assert_eq!(exception.type_name(), "IOException");
    assert_eq!(exception.to_string(), "IOException: read failed");
}

#[test]
fn catch_target_passes_resolution_errors_through() {
    let interp = interpreter_with(&outer_classes());
    let mut ctx = interp.context(interp.global_scope());

    let err = ctx
        .catch_target(|ctx| ctx.construct(&ClassPath::from("Outer.Inner"), vec![Value::int(1)]))
        .expect_err("resolution errors are not catchable");
    assert!(matches!(
        err.resolution_kind(),
        Some(EvalErrorKind::EnclosingInstanceRequired { .. })
    ));
}

#[test]
fn script_throw_is_catchable_and_prints_no_host_frames() {
    let table = ClassTable::new();
    table.define(ClassDef::top_level("Thrower").constructor(&[], |ctx| {
        Err(ctx.throw(
            Throwable::new("IllegalStateException", "bad").with_trace(vec![TraceFrame::new(
                "kiln.interp.Eval",
                "run",
            )]),
        ))
    }));
    let interp = Interpreter::builder().classes(table).build();
    let mut ctx = interp.context(interp.global_scope());

    let err = ctx
        .construct(&ClassPath::from("Thrower"), vec![])
        .expect_err("throws");
    let target = err.as_target().expect("script throws are target errors");
    assert!(!target.in_native_code());

    let mut out = Vec::new();
    err.write_stack_trace(false, &mut out).expect("write");
    assert!(out.is_empty());

    let caught = ctx
        .catch_target(|ctx| ctx.construct(&ClassPath::from("Thrower"), vec![]))
        .expect("caught")
        .expect_err("threw");
    let exception = caught.as_exception().expect("exception value");
    assert_eq!(exception.class_name(), "IllegalStateException");
    assert_eq!(exception.message(), Some("bad"));
}

#[test]
fn failed_construction_releases_instance_scope() {
    let interp = Interpreter::builder()
        .classes(reader_classes())
        .host(failing_host())
        .build();
    let before = interp.scopes().live_count();
    let mut ctx = interp.context(interp.global_scope());

    assert!(ctx.construct(&ClassPath::from("Wrapper"), vec![]).is_err());
    assert_eq!(interp.scopes().live_count(), before);
}
