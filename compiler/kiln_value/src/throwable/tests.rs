use std::error::Error;

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn display_matches_class_and_message() {
    assert_eq!(
        Throwable::new("IOException", "disk full").to_string(),
        "IOException: disk full"
    );
    assert_eq!(
        Throwable::without_message("NullPointerException").to_string(),
        "NullPointerException"
    );
}

#[test]
fn chain_walks_outer_to_inner() {
    let inner = Throwable::new("SocketException", "reset").into_ref();
    let real = Throwable::new("IOException", "read failed")
        .with_cause(inner)
        .into_ref();
    let wrapper = Throwable::invocation_wrapper(real);

    let names: Vec<&str> = wrapper.chain().map(Throwable::class_name).collect();
    assert_eq!(
        names,
        vec![
            "reflect.InvocationTargetException",
            "IOException",
            "SocketException"
        ]
    );
    assert!(wrapper.is_invocation_wrapper());
    assert_eq!(wrapper.kind(), ThrowableKind::InvocationWrapper);
}

#[test]
fn error_source_follows_cause() {
    let inner = Throwable::new("SocketException", "reset").into_ref();
    let outer = Throwable::new("IOException", "read failed").with_cause(inner);

    let source = outer.source().map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("SocketException: reset"));
}

#[test]
fn reflective_frames_are_recognized_by_substring() {
    assert!(TraceFrame::new("host.reflect.Method", "invoke").is_reflective());
    assert!(TraceFrame::new("host::reflect::dispatch", "call").is_reflective());
    assert!(TraceFrame::new("host.reflection.Dispatch", "call").is_reflective());
    assert!(TraceFrame::new("jdk.internal.reflectx.Accessor", "invoke").is_reflective());
    assert!(!TraceFrame::new("host.io.FileStore", "write").is_reflective());
}

#[test]
fn trace_frame_display() {
    assert_eq!(
        TraceFrame::new("host.io.FileStore", "write")
            .at("FileStore.java:42")
            .to_string(),
        "host.io.FileStore.write(FileStore.java:42)"
    );
    assert_eq!(
        TraceFrame::new("host.io.FileStore", "flush").to_string(),
        "host.io.FileStore.flush(Unknown Source)"
    );
}
