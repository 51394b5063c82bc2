//! The closed set of scalar kinds the store reads and writes.

use serde_json::Value;

/// A scalar value settable at a path.
///
/// The store deliberately supports a closed set of kinds instead of
/// arbitrary serializable types: device configuration is strings,
/// switches, and numbers. `From` conversions cover the common source
/// types so call sites can pass literals directly.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Scalar {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Scalar {
        Scalar::Int(v.into())
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Scalar {
        Scalar::Int(v.into())
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Scalar {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Scalar {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Scalar {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Scalar {
        Scalar::String(v)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Value {
        match scalar {
            Scalar::Bool(v) => Value::Bool(v),
            Scalar::Int(v) => Value::from(v),
            // Non-finite floats have no JSON representation; they
            // serialize as null.
            Scalar::Float(v) => Value::from(v),
            Scalar::String(v) => Value::String(v),
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for i64 {}
    impl Sealed for u64 {}
    impl Sealed for f64 {}
    impl Sealed for String {}
}

/// Typed extraction of a scalar from a tree node.
///
/// Implemented for the closed set of supported types. Extraction is
/// strict: a stored value of a different runtime type yields `None`
/// rather than a coerced value. Integer reads require an integer-stored
/// number that fits the requested width; `f64` accepts any stored
/// number; `bool` and `String` accept only their own type.
pub trait FromValue: Sized + sealed::Sealed {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<bool> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<i64> {
        value.as_i64()
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Option<u64> {
        value.as_u64()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<i32> {
        value.as_i64().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Option<u32> {
        value.as_u64().and_then(|n| u32::try_from(n).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<f64> {
        value.as_f64()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }
}
