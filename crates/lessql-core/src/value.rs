//! Dynamic SQL values.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::error::{Error, TypeError};

/// Text layout used for date/time values, both in SQL and in JSON output.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A dynamically-typed SQL value.
///
/// This enum represents the scalar values a row property can hold and is used
/// for parameter binding and result fetching.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,

    /// Boolean value, written to SQL as `'0'` / `'1'`
    Bool(bool),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    BigInt(i64),

    /// 64-bit floating point
    Double(f64),

    /// Text string
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// Date and time without zone, written as `YYYY-MM-DD HH:MM:SS`
    DateTime(NaiveDateTime),

    /// SQL text emitted verbatim, never quoted (e.g. `NOW()`)
    Literal(String),
}

impl Value {
    /// Wrap SQL text that must be emitted unquoted.
    pub fn literal(sql: impl Into<String>) -> Self {
        Value::Literal(sql.into())
    }

    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Double(_) => "DOUBLE",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::DateTime(_) => "DATETIME",
            Value::Literal(_) => "LITERAL",
        }
    }

    /// Try to convert this value to a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::BigInt(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Try to convert this value to an i64.
    ///
    /// Text holding a decimal integer converts too, since drivers without
    /// native integer columns hand keys back as text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(f64::from(*v)),
            Value::BigInt(v) => Some(*v as f64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Canonical text of a non-null value, used to compare key values.
    pub fn key_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::BigInt(v) => Some(v.to_string()),
            Value::Double(v) => Some(v.to_string()),
            Value::Text(s) | Value::Literal(s) => Some(s.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Value::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
        }
    }

    /// Loose key equality: `BigInt(1)`, `Int(1)` and `Text("1")` are the same key.
    ///
    /// NULL never equals anything, itself included.
    pub fn key_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Int(_) | Value::BigInt(_), _) | (_, Value::Int(_) | Value::BigInt(_)) => {
                match (self.as_i64(), other.as_i64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => self.key_text() == other.key_text(),
                }
            }
            _ => self.key_text() == other.key_text(),
        }
    }

    /// Convert to a JSON value; date/times render as text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::BigInt(v) => serde_json::Value::from(*v),
            Value::Double(v) => serde_json::Value::from(*v),
            Value::Text(s) | Value::Literal(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.format(DATETIME_FORMAT).to_string())
            }
        }
    }

    /// Convert a scalar JSON value.
    ///
    /// Arrays and objects are rejected: nested data becomes rows, never values.
    #[allow(clippy::result_large_err)]
    pub fn from_json(value: &serde_json::Value) -> crate::Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(v) => Ok(Value::Bool(*v)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::BigInt(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Double(f))
                } else {
                    Err(Error::Type(TypeError {
                        expected: "number representable as i64 or f64",
                        actual: n.to_string(),
                        column: None,
                    }))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            other => Err(Error::Type(TypeError {
                expected: "scalar JSON value",
                actual: if other.is_array() { "array" } else { "object" }.to_string(),
                column: None,
            })),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::BigInt(v) => serializer.serialize_i64(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Text(s) | Value::Literal(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::DateTime(dt) => serializer.collect_str(&dt.format(DATETIME_FORMAT)),
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::BigInt(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_i64().ok_or_else(|| {
            Error::Type(TypeError {
                expected: "i64",
                actual: value.type_name().to_string(),
                column: None,
            })
        })
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_f64().ok_or_else(|| {
            Error::Type(TypeError {
                expected: "f64",
                actual: value.type_name().to_string(),
                column: None,
            })
        })
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(s) | Value::Literal(s) => Ok(s),
            other => Err(Error::Type(TypeError {
                expected: "string",
                actual: other.type_name().to_string(),
                column: None,
            })),
        }
    }
}

/// One value or a list of values, the right-hand side of an `is` predicate.
///
/// A single NULL and a list containing NULL produce different SQL, so the
/// two shapes stay distinct.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    One(Value),
    List(Vec<Value>),
}

impl Values {
    /// Flatten into a list, wrapping a single value.
    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Values::One(v) => vec![v],
            Values::List(list) => list,
        }
    }
}

macro_rules! values_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Values {
                fn from(v: $ty) -> Self {
                    Values::One(Value::from(v))
                }
            }
        )*
    };
}

values_from_scalar!(Value, bool, i32, i64, u32, f64, String, &str, &String, NaiveDateTime);

impl<T: Into<Value>> From<Vec<T>> for Values {
    fn from(v: Vec<T>) -> Self {
        Values::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Values {
    fn from(v: [T; N]) -> Self {
        Values::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Values {
    fn from(v: Option<T>) -> Self {
        Values::One(Value::from(v))
    }
}
