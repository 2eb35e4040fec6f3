use std::sync::Arc;

use kiln_value::EvalErrorKind;
use pretty_assertions::assert_eq;

use super::*;
use crate::classes::ClassTable;

struct Fixture {
    scopes: Arc<ScopeArena>,
    global: ScopeId,
    classes: ClassTable,
}

impl Fixture {
    fn new() -> Self {
        let (scopes, global) = ScopeArena::with_root("global");
        let classes = ClassTable::new();
        let outer = ClassPath::from("Outer");
        classes.define(ClassDef::top_level("Outer"));
        classes.define(ClassDef::inner_of(&outer, "Inner"));
        classes.define(ClassDef::static_of(&outer, "InStatic"));
        classes.define(ClassDef::inner_of(&ClassPath::from("Outer.Inner"), "Deep"));
        Fixture {
            scopes,
            global,
            classes,
        }
    }

    fn resolver(&self) -> EnclosingResolver<'_> {
        EnclosingResolver::new(&self.scopes, &self.classes)
    }

    /// Allocate an owned instance scope, the way construction does.
    fn instance(&self, class: &str, enclosing: Option<&ObjectRef>) -> ObjectRef {
        let parent = enclosing.map_or(self.global, ObjectRef::scope);
        let scope = self.scopes.alloc(class, Some(parent)).expect("alloc");
        let object = ObjectRef::new(
            ClassPath::from(class),
            self.scopes.lease(scope),
            enclosing.cloned(),
        );
        self.scopes.bind_owner(scope, &object).expect("bind");
        object
    }

    fn frame_in(&self, object: &ObjectRef) -> ScopeId {
        self.scopes.alloc("frame", Some(object.scope())).expect("alloc")
    }
}

fn kind(err: &EvalError) -> &EvalErrorKind {
    err.resolution_kind().expect("resolution error")
}

// Path form

#[test]
fn path_without_instance_context_is_an_error() {
    let fx = Fixture::new();
    let path = ClassPath::from("Outer.Inner");
    let err = fx
        .resolver()
        .resolve(ConstructTarget::Path(&path), fx.global)
        .expect_err("no enclosing instance");

    assert_eq!(
        kind(&err),
        &EvalErrorKind::EnclosingInstanceRequired {
            class: "Outer.Inner".to_string()
        }
    );
    assert_eq!(
        err.notes,
        vec![EvalNote::new(
            "Outer.Inner is an inner class of Outer; construct it through an instance, \
             e.g. `outer.new Inner()`"
        )]
    );
}

#[test]
fn path_binds_to_ambient_this() {
    let fx = Fixture::new();
    let outer = fx.instance("Outer", None);
    let frame = fx.frame_in(&outer);

    let path = ClassPath::from("Inner");
    let resolved = fx
        .resolver()
        .resolve(ConstructTarget::Path(&path), frame)
        .expect("resolves");

    assert_eq!(resolved.class.path(), &ClassPath::from("Outer.Inner"));
    assert_eq!(resolved.binding.instance, Some(outer));
    assert_eq!(resolved.binding.receiver, Receiver::Ambient);
    assert!(!resolved.binding.static_context);
}

#[test]
fn path_from_inner_instance_reaches_outer_through_enclosing_chain() {
    let fx = Fixture::new();
    let outer = fx.instance("Outer", None);
    let inner = fx.instance("Outer.Inner", Some(&outer));
    let frame = fx.frame_in(&inner);

    // A sibling `Inner` built from inside an `Inner` binds to the same `Outer`.
    let path = ClassPath::from("Inner");
    let resolved = fx
        .resolver()
        .resolve(ConstructTarget::Path(&path), frame)
        .expect("resolves");
    assert_eq!(resolved.binding.instance, Some(outer));

    let deep = ClassPath::from("Deep");
    let resolved = fx
        .resolver()
        .resolve(ConstructTarget::Path(&deep), frame)
        .expect("resolves");
    assert_eq!(resolved.class.path(), &ClassPath::from("Outer.Inner.Deep"));
    assert_eq!(resolved.binding.instance, Some(inner));
}

#[test]
fn path_to_static_nested_needs_no_instance() {
    let fx = Fixture::new();
    let path = ClassPath::from("Outer.InStatic");
    let resolved = fx
        .resolver()
        .resolve(ConstructTarget::Path(&path), fx.global)
        .expect("resolves");

    assert_eq!(resolved.binding.instance, None);
    assert_eq!(resolved.binding.receiver, Receiver::None);
    assert!(resolved.binding.static_context);
}

#[test]
fn unknown_class_is_reported() {
    let fx = Fixture::new();
    let path = ClassPath::from("Nowhere");
    let err = fx
        .resolver()
        .resolve(ConstructTarget::Path(&path), fx.global)
        .expect_err("unknown");
    assert_eq!(
        kind(&err),
        &EvalErrorKind::ClassNotFound {
            path: "Nowhere".to_string()
        }
    );
}

// Qualified form

#[test]
fn explicit_receiver_wins_over_ambient_this() {
    let fx = Fixture::new();
    let ambient = fx.instance("Outer", None);
    let explicit = fx.instance("Outer", None);
    let frame = fx.frame_in(&ambient);

    let receiver = Value::Object(explicit.clone());
    let resolved = fx
        .resolver()
        .resolve(
            ConstructTarget::Qualified {
                receiver: &receiver,
                member: "Inner",
            },
            frame,
        )
        .expect("resolves");

    assert_eq!(resolved.binding.instance, Some(explicit));
    assert_eq!(resolved.binding.receiver, Receiver::Explicit);
}

#[test]
fn qualified_receiver_must_be_an_object() {
    let fx = Fixture::new();
    let receiver = Value::int(3);
    let err = fx
        .resolver()
        .resolve(
            ConstructTarget::Qualified {
                receiver: &receiver,
                member: "Inner",
            },
            fx.global,
        )
        .expect_err("not an object");
    assert_eq!(
        kind(&err),
        &EvalErrorKind::NotAnObject {
            type_name: "int".to_string()
        }
    );
}

#[test]
fn qualified_member_must_exist_on_receiver_class() {
    let fx = Fixture::new();
    let receiver = Value::Object(fx.instance("Outer", None));
    let err = fx
        .resolver()
        .resolve(
            ConstructTarget::Qualified {
                receiver: &receiver,
                member: "Missing",
            },
            fx.global,
        )
        .expect_err("unknown member");
    assert_eq!(
        kind(&err),
        &EvalErrorKind::ClassNotFound {
            path: "Outer.Missing".to_string()
        }
    );
}

// Static form

#[test]
fn static_path_to_inner_class_is_not_a_static_member() {
    let fx = Fixture::new();
    let path = ClassPath::from("Outer.Inner");
    let err = fx
        .resolver()
        .resolve(ConstructTarget::Static(&path), fx.global)
        .expect_err("not static");

    assert_eq!(
        err.message,
        "Static method Inner() not found in class 'Outer'"
    );
}

#[test]
fn static_path_ignores_ambient_instances() {
    let fx = Fixture::new();
    let outer = fx.instance("Outer", None);
    let frame = fx.frame_in(&outer);
    let path = ClassPath::from("Outer.Inner");

    assert!(fx
        .resolver()
        .resolve(ConstructTarget::Static(&path), frame)
        .is_err());
}

#[test]
fn static_path_constructs_static_nested_and_top_level() {
    let fx = Fixture::new();
    for path in ["Outer.InStatic", "Outer"] {
        let path = ClassPath::from(path);
        let resolved = fx
            .resolver()
            .resolve(ConstructTarget::Static(&path), fx.global)
            .expect("resolves");
        assert_eq!(resolved.class.path(), &path);
        assert!(resolved.binding.static_context);
        assert_eq!(resolved.binding.instance, None);
    }
}

#[test]
fn static_path_to_unknown_member_names_it() {
    let fx = Fixture::new();
    let path = ClassPath::from("Outer.nothing");
    let err = fx
        .resolver()
        .resolve(ConstructTarget::Static(&path), fx.global)
        .expect_err("unknown");
    assert_eq!(
        kind(&err),
        &EvalErrorKind::StaticMemberNotFound {
            member: "nothing".to_string(),
            class: "Outer".to_string()
        }
    );
}

#[test]
fn targets_display_as_written() {
    let path = ClassPath::from("Outer.Inner");
    assert_eq!(ConstructTarget::Path(&path).to_string(), "new Outer.Inner");
    assert_eq!(ConstructTarget::Static(&path).to_string(), "Outer.Inner");
    let receiver = Value::int(1);
    assert_eq!(
        ConstructTarget::Qualified {
            receiver: &receiver,
            member: "Inner"
        }
        .to_string(),
        "int.new Inner"
    );
}
