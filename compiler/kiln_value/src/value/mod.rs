//! Runtime values for the Kiln interpreter.
//!
//! # Null vs. undeclared
//!
//! `Value::Null` is a *value*: a variable holding it is declared. An
//! undeclared variable has no `Value` at all and lookups report it as
//! missing. Host stores that have a native null (a key present with no
//! value) must keep the two apart; see the external scope adapter.

mod object;

use std::fmt;
use std::sync::Arc;

pub use object::{Instance, ObjectRef, ReleaseScope, ScopeLease, WeakObjectRef};

use crate::throwable::ThrowableRef;

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// The null marker: declared, holds nothing.
    Null,
    /// Result of a body or method that returns nothing.
    Void,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// A script object.
    Object(ObjectRef),
    /// A caught exception, as seen by a script-level handler.
    Exception(ThrowableRef),
}

impl Value {
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// String value; the text is copied into a shared buffer.
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The script instance, if this is one.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The host exception, if this is one.
    pub fn as_exception(&self) -> Option<&ThrowableRef> {
        match self {
            Value::Exception(throwable) => Some(throwable),
            _ => None,
        }
    }

    /// Name of the value's runtime type, for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Void => "void".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Object(object) => object.class().to_string(),
            Value::Exception(throwable) => throwable.class_name().to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Exception(a), Value::Exception(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Void => f.write_str("void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Object(object) => write!(f, "{object:?}"),
            Value::Exception(throwable) => write!(f, "{throwable}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}
