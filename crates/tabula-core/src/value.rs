//! Dynamic literal and stored values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DataType, EnumType};

/// A single enumerator of a named enumeration type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enumerator {
    /// Name of the enumeration type
    pub type_name: String,
    /// Name of the enumerator
    pub name: String,
}

impl Enumerator {
    /// Create a new enumerator value.
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// A dynamically-typed value.
///
/// Annotation anchors are written as `Value`s in the declared type domain;
/// after conversion the same enum carries stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The null-marker
    Null,

    Bool(bool),
    Char(char),

    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),

    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),

    F32(f32),
    F64(f64),

    /// Fixed-point decimal
    Decimal(Decimal),

    Text(String),
    Guid(Uuid),

    Date(NaiveDate),
    DateTime(NaiveDateTime),

    /// Enumerator of a named enumeration
    Enum(Enumerator),

    /// Sequence literal; never a valid scalar anchor
    Array(Vec<Value>),
}

impl Value {
    /// Check if this value is the null-marker.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is an array literal.
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Create an enumerator value.
    pub fn enumerator(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Value::Enum(Enumerator::new(type_name, name))
    }

    /// The logical type of this value, if it has one.
    ///
    /// The null-marker and arrays have no scalar type. The enumerator list of
    /// an enumeration type is not known from a single value, so the reported
    /// type carries the name only; compare enumeration types by name.
    pub fn data_type(&self) -> Option<DataType> {
        let ty = match self {
            Value::Null | Value::Array(_) => return None,
            Value::Bool(_) => DataType::Bool,
            Value::Char(_) => DataType::Char,
            Value::I8(_) => DataType::I8,
            Value::I16(_) => DataType::I16,
            Value::I32(_) => DataType::I32,
            Value::I64(_) => DataType::I64,
            Value::U8(_) => DataType::U8,
            Value::U16(_) => DataType::U16,
            Value::U32(_) => DataType::U32,
            Value::U64(_) => DataType::U64,
            Value::F32(_) => DataType::F32,
            Value::F64(_) => DataType::F64,
            Value::Decimal(_) => DataType::Decimal,
            Value::Text(_) => DataType::Text,
            Value::Guid(_) => DataType::Guid,
            Value::Date(_) => DataType::Date,
            Value::DateTime(_) => DataType::DateTime,
            Value::Enum(e) => DataType::Enumeration(EnumType {
                name: e.type_name.clone(),
                enumerators: Vec::new(),
            }),
        };
        Some(ty)
    }

    /// Check if this value is of exactly the given type.
    ///
    /// Enumerations match by type name.
    pub fn is_of_type(&self, expected: &DataType) -> bool {
        match (self, expected) {
            (Value::Enum(e), DataType::Enumeration(t)) => e.type_name == t.name,
            _ => self.data_type().as_ref() == Some(expected),
        }
    }

    /// Name of this value's type, for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Array(_) => "array".to_string(),
            other => other
                .data_type()
                .map(|t| t.to_string())
                .unwrap_or_default(),
        }
    }

    /// Integer payload widened to `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::I8(v) => Some(i128::from(*v)),
            Value::I16(v) => Some(i128::from(*v)),
            Value::I32(v) => Some(i128::from(*v)),
            Value::I64(v) => Some(i128::from(*v)),
            Value::U8(v) => Some(i128::from(*v)),
            Value::U16(v) => Some(i128::from(*v)),
            Value::U32(v) => Some(i128::from(*v)),
            Value::U64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Numeric payload as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            Value::Decimal(d) => rust_decimal::prelude::ToPrimitive::to_f64(d),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Build an integer value of the given type, if `n` fits.
    pub fn integer(ty: &DataType, n: i128) -> Option<Self> {
        let value = match ty {
            DataType::I8 => Value::I8(i8::try_from(n).ok()?),
            DataType::I16 => Value::I16(i16::try_from(n).ok()?),
            DataType::I32 => Value::I32(i32::try_from(n).ok()?),
            DataType::I64 => Value::I64(i64::try_from(n).ok()?),
            DataType::U8 => Value::U8(u8::try_from(n).ok()?),
            DataType::U16 => Value::U16(u16::try_from(n).ok()?),
            DataType::U32 => Value::U32(u32::try_from(n).ok()?),
            DataType::U64 => Value::U64(u64::try_from(n).ok()?),
            _ => return None,
        };
        Some(value)
    }

    /// Build a numeric value of the given type from any numeric value.
    ///
    /// Returns `None` if the value does not fit the target type exactly
    /// (integers) or is outside the representable range (floats, decimals).
    pub fn numeric(ty: &DataType, from: &Value) -> Option<Self> {
        if ty.is_integer() {
            if let Some(n) = from.as_i128() {
                return Value::integer(ty, n);
            }
            let f = from.as_f64()?;
            if f.fract() != 0.0 || !f.is_finite() {
                return None;
            }
            return Value::integer(ty, f as i128);
        }
        match ty {
            DataType::F32 => {
                let f = from.as_f64()?;
                let narrowed = f as f32;
                (narrowed.is_finite() || !f.is_finite()).then_some(Value::F32(narrowed))
            }
            DataType::F64 => from.as_f64().map(Value::F64),
            DataType::Decimal => match from {
                Value::Decimal(d) => Some(Value::Decimal(*d)),
                other => {
                    if let Some(n) = other.as_i128() {
                        return Decimal::try_from_i128_with_scale(n, 0)
                            .ok()
                            .map(Value::Decimal);
                    }
                    rust_decimal::prelude::FromPrimitive::from_f64(other.as_f64()?)
                        .map(Value::Decimal)
                }
            },
            _ => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
            (Value::I8(a), Value::I8(b)) => a.partial_cmp(b),
            (Value::I16(a), Value::I16(b)) => a.partial_cmp(b),
            (Value::I32(a), Value::I32(b)) => a.partial_cmp(b),
            (Value::I64(a), Value::I64(b)) => a.partial_cmp(b),
            (Value::U8(a), Value::U8(b)) => a.partial_cmp(b),
            (Value::U16(a), Value::U16(b)) => a.partial_cmp(b),
            (Value::U32(a), Value::U32(b)) => a.partial_cmp(b),
            (Value::U64(a), Value::U64(b)) => a.partial_cmp(b),
            (Value::F32(a), Value::F32(b)) => a.partial_cmp(b),
            (Value::F64(a), Value::F64(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Guid(a), Value::Guid(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            (Value::Enum(a), Value::Enum(b)) if a.type_name == b.type_name => {
                (a.name == b.name).then_some(Ordering::Equal)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "'{}'", v.escape_default()),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "\"{v}\""),
            Value::Guid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Value::Enum(e) => write!(f, "{}::{}", e.type_name, e.name),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => Text,
    Uuid => Guid,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    Enumerator => Enum,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
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

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_of_literals() {
        assert_eq!(Value::U16(3).data_type(), Some(DataType::U16));
        assert_eq!(Value::Null.data_type(), None);
        assert_eq!(Value::Array(vec![Value::I32(1)]).data_type(), None);
        let color = DataType::enumeration("Color", ["Red"]);
        assert!(Value::enumerator("Color", "Red").is_of_type(&color));
        assert!(!Value::enumerator("Shade", "Red").is_of_type(&color));
        assert!(!Value::I32(5).is_of_type(&DataType::U64));
    }

    #[test]
    fn test_ordering_same_variant_only() {
        assert!(Value::I32(1) < Value::I32(2));
        assert!(Value::Text("a".into()) < Value::Text("b".into()));
        assert_eq!(Value::I32(1).partial_cmp(&Value::I64(1)), None);
        assert_eq!(
            Value::enumerator("Color", "Red").partial_cmp(&Value::enumerator("Color", "Blue")),
            None
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Text("abc".into()).to_string(), "\"abc\"");
        assert_eq!(Value::Char('x').to_string(), "'x'");
        assert_eq!(Value::enumerator("Color", "Red").to_string(), "Color::Red");
        assert_eq!(Value::from(vec![1_i32, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_numeric_conversion() {
        assert_eq!(Value::numeric(&DataType::I64, &Value::U16(7)), Some(Value::I64(7)));
        assert_eq!(Value::numeric(&DataType::U8, &Value::I32(-1)), None);
        assert_eq!(Value::numeric(&DataType::U8, &Value::I32(300)), None);
        assert_eq!(Value::numeric(&DataType::F64, &Value::I8(-3)), Some(Value::F64(-3.0)));
        assert_eq!(
            Value::numeric(&DataType::Decimal, &Value::I32(12)),
            Some(Value::Decimal(Decimal::from(12)))
        );
        assert_eq!(Value::numeric(&DataType::Decimal, &Value::F64(f64::INFINITY)), None);
    }
}
