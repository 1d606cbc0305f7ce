//! Semantic parameter types and bound values.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Converter used by fallback types. Returns `None` when the text does not parse.
pub type Converter = fn(&str) -> Option<Value>;

/// Declared type of an operand.
#[derive(Clone)]
pub enum ValueType {
    Bool,
    Int32,
    UInt16,
    UInt32,
    Double,
    String,
    /// Any other type, converted through its `FromStr` implementation.
    Parsed {
        type_name: &'static str,
        convert: Converter,
    },
}

impl ValueType {
    /// Fallback type for any `T: FromStr`.
    ///
    /// Bound values are stored as [`Value::Other`] and read back with
    /// [`BoundCall::get`](crate::BoundCall::get).
    pub fn parsed<T>() -> Self
    where
        T: FromStr + Send + Sync + 'static,
    {
        Self::Parsed {
            type_name: short_type_name::<T>(),
            convert: convert_from_str::<T>,
        }
    }

    /// Name shown in help text and conversion errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "i32",
            Self::UInt16 => "u16",
            Self::UInt32 => "u32",
            Self::Double => "f64",
            Self::String => "String",
            Self::Parsed { type_name, .. } => *type_name,
        }
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed { type_name, .. } => write!(f, "Parsed({type_name})"),
            other => f.write_str(other.name()),
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

fn convert_from_str<T>(raw: &str) -> Option<Value>
where
    T: FromStr + Send + Sync + 'static,
{
    raw.parse::<T>()
        .ok()
        .map(|v| Value::Other(Arc::new(v) as Arc<dyn Any + Send + Sync>))
}

/// `std::any::type_name` without the module path (`core::net::IpAddr` -> `IpAddr`).
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

/// A converted argument value.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    UInt16(u16),
    UInt32(u32),
    Double(f64),
    Str(String),
    Other(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Self::UInt16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Downcast a fallback-typed value.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Other(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::UInt16(a), Self::UInt16(b)) => a == b,
            (Self::UInt32(a), Self::UInt32(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Other(a), Self::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
