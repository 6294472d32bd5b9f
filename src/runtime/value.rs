//! Dynamic value carrier for arguments and results.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::NaiveDateTime;

use crate::{
    metadata::signatures::TypeSignature,
    runtime::ObjectRef,
    Error, Result,
};

/// Runtime value passed through the interception contract.
///
/// `Value` carries every argument and return value between a caller, a synthesized proxy
/// member, an interceptor and the source instance. Value types are boxed into the matching
/// variant on the way in and unboxed with [`TryFrom`] on the way out; reference types are
/// carried by reference.
///
/// # Type Mapping
///
/// | Signature | Value Variant |
/// |-----------|---------------|
/// | `void` | [`Value::Void`] |
/// | `bool` | [`Value::Bool`] |
/// | `char` | [`Value::Char`] |
/// | `int32` | [`Value::I4`] |
/// | `int64` | [`Value::I8`] |
/// | `float64` | [`Value::R8`] |
/// | `string` | [`Value::String`] |
/// | `System.DateTime` | [`Value::DateTime`] |
/// | class / interface / `object` | [`Value::Object`] |
/// | `delegate` | [`Value::Delegate`] |
/// | `T[]` | [`Value::Array`] |
/// | null reference | [`Value::Null`] |
#[derive(Clone)]
pub enum Value {
    /// No value, returned by `void` members
    Void,
    /// Null reference
    Null,
    /// Boolean
    Bool(bool),
    /// Unicode character
    Char(char),
    /// 32-bit signed integer
    I4(i32),
    /// 64-bit signed integer
    I8(i64),
    /// 64-bit floating point
    R8(f64),
    /// String
    String(String),
    /// Date and time without offset
    DateTime(NaiveDateTime),
    /// Reference to a live object
    Object(ObjectRef),
    /// Event handler
    Delegate(Delegate),
    /// Single dimension array
    Array(Vec<Value>),
}

impl Value {
    /// Name of the kind of this value, as used in cast errors
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::I4(_) => "int32",
            Value::I8(_) => "int64",
            Value::R8(_) => "float64",
            Value::String(_) => "string",
            Value::DateTime(_) => "System.DateTime",
            Value::Object(_) => "object",
            Value::Delegate(_) => "delegate",
            Value::Array(_) => "array",
        }
    }

    /// Returns `true` for [`Value::Void`]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Returns `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the object reference, if this is an object
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Checks whether this value can be stored in a location of type `signature`.
    ///
    /// Value types match exactly, with no widening. Reference types accept [`Value::Null`];
    /// `Class(t)` accepts objects whose runtime type is or implements `t`; `object` and
    /// unbound generic parameters accept any value but `void`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dynproxy::{metadata::signatures::TypeSignature, runtime::Value};
    ///
    /// assert!(Value::I4(3).conforms_to(&TypeSignature::I4));
    /// assert!(!Value::I4(3).conforms_to(&TypeSignature::I8));
    /// assert!(Value::Null.conforms_to(&TypeSignature::String));
    /// assert!(!Value::Null.conforms_to(&TypeSignature::R8));
    /// ```
    #[must_use]
    pub fn conforms_to(&self, signature: &TypeSignature) -> bool {
        match (signature, self) {
            (TypeSignature::Void, Value::Void)
            | (TypeSignature::Boolean, Value::Bool(_))
            | (TypeSignature::Char, Value::Char(_))
            | (TypeSignature::I4, Value::I4(_))
            | (TypeSignature::I8, Value::I8(_))
            | (TypeSignature::R8, Value::R8(_))
            | (TypeSignature::DateTime, Value::DateTime(_))
            | (TypeSignature::String, Value::String(_) | Value::Null)
            | (TypeSignature::Delegate, Value::Delegate(_) | Value::Null)
            | (TypeSignature::Class(_) | TypeSignature::SzArray(_), Value::Null) => true,
            (TypeSignature::Object, value)
            | (TypeSignature::GenericParam(_) | TypeSignature::MethodGenericParam(_), value) => {
                !value.is_void()
            }
            (TypeSignature::Class(token), Value::Object(object)) => {
                object.runtime_type().implements(*token)
            }
            (TypeSignature::SzArray(inner), Value::Array(items)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            _ => false,
        }
    }

    /// Builds the cast error for converting this value to `expected`
    pub(crate) fn cast_error(&self, expected: impl fmt::Display) -> Error {
        Error::InvalidCast {
            expected: expected.to_string(),
            found: self.type_name().to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => write!(f, "String({v:?})"),
            Value::Object(o) => write!(f, "Object({})", o.runtime_type().fullname()),
            Value::Delegate(d) => write!(f, "{d:?}"),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "'{v}'"),
            Value::I4(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}L"),
            Value::R8(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Object(o) => write!(f, "{}", o.runtime_type().fullname()),
            Value::Delegate(d) => write!(f, "delegate#{}", d.id()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I4(a), Value::I4(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::R8(a), Value::R8(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Value::Delegate(a), Value::Delegate(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

/// Boxing (`From<T> for Value`) and unboxing (`TryFrom<Value> for T`) for one carrier type.
macro_rules! value_conversion {
    ($rust:ty, $variant:ident, $expected:expr) => {
        impl From<$rust> for Value {
            fn from(value: $rust) -> Self {
                Value::$variant(value)
            }
        }

        impl TryFrom<Value> for $rust {
            type Error = Error;

            fn try_from(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(other.cast_error($expected)),
                }
            }
        }

        impl TryFrom<&Value> for $rust {
            type Error = Error;

            fn try_from(value: &Value) -> Result<Self> {
                match value {
                    Value::$variant(inner) => Ok(inner.clone()),
                    other => Err(other.cast_error($expected)),
                }
            }
        }
    };
}

value_conversion!(bool, Bool, TypeSignature::Boolean);
value_conversion!(char, Char, TypeSignature::Char);
value_conversion!(i32, I4, TypeSignature::I4);
value_conversion!(i64, I8, TypeSignature::I8);
value_conversion!(f64, R8, TypeSignature::R8);
value_conversion!(String, String, TypeSignature::String);
value_conversion!(NaiveDateTime, DateTime, TypeSignature::DateTime);
value_conversion!(ObjectRef, Object, TypeSignature::Object);
value_conversion!(Delegate, Delegate, TypeSignature::Delegate);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Void
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

static NEXT_DELEGATE: AtomicU64 = AtomicU64::new(1);

/// Callback type wrapped by a [`Delegate`]
pub type DelegateFn = dyn Fn(&[Value]) -> Result<()> + Send + Sync;

/// An event handler.
///
/// Delegates compare by identity: clones of one delegate are equal, two delegates built from
/// identical closures are not. Subscribing and unsubscribing rely on this.
#[derive(Clone)]
pub struct Delegate {
    id: u64,
    callback: Arc<DelegateFn>,
}

impl Delegate {
    /// Wrap a callback into a new delegate with a fresh identity
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Delegate {
            id: NEXT_DELEGATE.fetch_add(1, Ordering::Relaxed),
            callback: Arc::new(callback),
        }
    }

    /// Identity of this delegate
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Invoke the callback
    ///
    /// # Errors
    /// Returns whatever the callback returns.
    pub fn invoke(&self, args: &[Value]) -> Result<()> {
        (self.callback)(args)
    }
}

impl PartialEq for Delegate {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Delegate {}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delegate({})", self.id)
    }
}
