//! Logical data types and their capabilities.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// An enumeration type: a name plus its ordered enumerators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    /// Type name as written in the data model (e.g. `Color`)
    pub name: String,
    /// Enumerator names in declaration order
    pub enumerators: Vec<String>,
}

impl EnumType {
    /// Create a new enumeration type.
    pub fn new<I, S>(name: impl Into<String>, enumerators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            enumerators: enumerators.into_iter().map(Into::into).collect(),
        }
    }

    /// Position of an enumerator, if it is defined.
    pub fn position(&self, enumerator: &str) -> Option<usize> {
        self.enumerators.iter().position(|e| e == enumerator)
    }

    /// Check if an enumerator is defined.
    pub fn contains(&self, enumerator: &str) -> bool {
        self.position(enumerator).is_some()
    }
}

/// Logical type of a Field, independent of any storage engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Char,

    // Signed integers
    I8,
    I16,
    I32,
    I64,

    // Unsigned integers
    U8,
    U16,
    U32,
    U64,

    // Floating point
    F32,
    F64,

    // Fixed point
    Decimal,

    Text,
    Guid,

    // Temporal
    Date,
    DateTime,

    Enumeration(EnumType),
}

impl DataType {
    /// Create an enumeration type.
    pub fn enumeration<I, S>(name: impl Into<String>, enumerators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataType::Enumeration(EnumType::new(name, enumerators))
    }

    /// Check if this type is an integer type.
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::I8
                | DataType::I16
                | DataType::I32
                | DataType::I64
                | DataType::U8
                | DataType::U16
                | DataType::U32
                | DataType::U64
        )
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, DataType::F32 | DataType::F64 | DataType::Decimal)
    }

    /// Check if this type is a signed numeric type.
    pub const fn is_signed(&self) -> bool {
        matches!(
            self,
            DataType::I8
                | DataType::I16
                | DataType::I32
                | DataType::I64
                | DataType::F32
                | DataType::F64
                | DataType::Decimal
        )
    }

    /// Check if this type is textual.
    pub const fn is_textual(&self) -> bool {
        matches!(self, DataType::Text)
    }

    /// Check if this type is a date/time type.
    pub const fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::DateTime)
    }

    /// Check if values of this type have a total order.
    ///
    /// Booleans, GUIDs and enumerations are only equatable.
    pub const fn is_orderable(&self) -> bool {
        self.is_numeric() || self.is_temporal() || matches!(self, DataType::Char | DataType::Text)
    }

    /// The type in which an annotation literal for this type is written.
    ///
    /// Dates, date-times and GUIDs are written as text and parsed; decimals
    /// are written as `f64` and range-checked.
    pub fn literal_type(&self) -> DataType {
        match self {
            DataType::Date | DataType::DateTime | DataType::Guid => DataType::Text,
            DataType::Decimal => DataType::F64,
            other => other.clone(),
        }
    }

    /// The numeric zero of this type.
    pub fn zero(&self) -> Option<Value> {
        match self {
            DataType::I8 => Some(Value::I8(0)),
            DataType::I16 => Some(Value::I16(0)),
            DataType::I32 => Some(Value::I32(0)),
            DataType::I64 => Some(Value::I64(0)),
            DataType::U8 => Some(Value::U8(0)),
            DataType::U16 => Some(Value::U16(0)),
            DataType::U32 => Some(Value::U32(0)),
            DataType::U64 => Some(Value::U64(0)),
            DataType::F32 => Some(Value::F32(0.0)),
            DataType::F64 => Some(Value::F64(0.0)),
            DataType::Decimal => Some(Value::Decimal(rust_decimal::Decimal::ZERO)),
            _ => None,
        }
    }

    /// The smallest representable value, for orderable types that have one.
    pub fn min_value(&self) -> Option<Value> {
        match self {
            DataType::I8 => Some(Value::I8(i8::MIN)),
            DataType::I16 => Some(Value::I16(i16::MIN)),
            DataType::I32 => Some(Value::I32(i32::MIN)),
            DataType::I64 => Some(Value::I64(i64::MIN)),
            DataType::U8 => Some(Value::U8(u8::MIN)),
            DataType::U16 => Some(Value::U16(u16::MIN)),
            DataType::U32 => Some(Value::U32(u32::MIN)),
            DataType::U64 => Some(Value::U64(u64::MIN)),
            DataType::F32 => Some(Value::F32(f32::NEG_INFINITY)),
            DataType::F64 => Some(Value::F64(f64::NEG_INFINITY)),
            DataType::Decimal => Some(Value::Decimal(rust_decimal::Decimal::MIN)),
            DataType::Char => Some(Value::Char('\0')),
            DataType::Text => Some(Value::Text(String::new())),
            DataType::Date => min_date().map(Value::Date),
            DataType::DateTime => min_date()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(Value::DateTime),
            DataType::Bool | DataType::Guid | DataType::Enumeration(_) => None,
        }
    }

    /// The largest representable value, for orderable types that have one.
    pub fn max_value(&self) -> Option<Value> {
        match self {
            DataType::I8 => Some(Value::I8(i8::MAX)),
            DataType::I16 => Some(Value::I16(i16::MAX)),
            DataType::I32 => Some(Value::I32(i32::MAX)),
            DataType::I64 => Some(Value::I64(i64::MAX)),
            DataType::U8 => Some(Value::U8(u8::MAX)),
            DataType::U16 => Some(Value::U16(u16::MAX)),
            DataType::U32 => Some(Value::U32(u32::MAX)),
            DataType::U64 => Some(Value::U64(u64::MAX)),
            DataType::F32 => Some(Value::F32(f32::INFINITY)),
            DataType::F64 => Some(Value::F64(f64::INFINITY)),
            DataType::Decimal => Some(Value::Decimal(rust_decimal::Decimal::MAX)),
            DataType::Char => Some(Value::Char(char::MAX)),
            DataType::Date => max_date().map(Value::Date),
            DataType::DateTime => max_date()
                .and_then(|d| d.and_hms_opt(23, 59, 59))
                .map(Value::DateTime),
            DataType::Text | DataType::Bool | DataType::Guid | DataType::Enumeration(_) => None,
        }
    }

    /// Check if a value lies between this type's sentinel extremes.
    pub fn in_range(&self, value: &Value) -> bool {
        let (Some(min), Some(max)) = (self.min_value(), self.max_value()) else {
            return true;
        };
        value >= &min && value <= &max
    }
}

fn min_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1, 1, 1)
}

fn max_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Char => "char",
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::Decimal => "Decimal",
            DataType::Text => "String",
            DataType::Guid => "Uuid",
            DataType::Date => "Date",
            DataType::DateTime => "DateTime",
            DataType::Enumeration(e) => return f.write_str(&e.name),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities() {
        assert!(DataType::U16.is_orderable());
        assert!(DataType::U16.is_numeric());
        assert!(!DataType::U16.is_signed());
        assert!(DataType::Decimal.is_signed());
        assert!(!DataType::Bool.is_orderable());
        assert!(!DataType::Guid.is_orderable());
        assert!(!DataType::enumeration("Color", ["Red"]).is_orderable());
        assert!(DataType::Text.is_orderable());
        assert!(DataType::Text.is_textual());
        assert!(!DataType::Char.is_textual());
    }

    #[test]
    fn literal_types() {
        assert_eq!(DataType::Date.literal_type(), DataType::Text);
        assert_eq!(DataType::Guid.literal_type(), DataType::Text);
        assert_eq!(DataType::Decimal.literal_type(), DataType::F64);
        assert_eq!(DataType::U64.literal_type(), DataType::U64);
    }

    #[test]
    fn sentinels() {
        assert_eq!(DataType::U16.max_value(), Some(Value::U16(u16::MAX)));
        assert_eq!(DataType::Text.min_value(), Some(Value::Text(String::new())));
        assert_eq!(DataType::Text.max_value(), None);
        assert_eq!(DataType::Bool.min_value(), None);
        assert!(DataType::Date.min_value().is_some());
        assert!(DataType::DateTime.max_value().is_some());
    }

    #[test]
    fn display_names() {
        assert_eq!(DataType::Bool.to_string(), "bool");
        assert_eq!(DataType::Text.to_string(), "String");
        assert_eq!(DataType::enumeration("Color", ["Red"]).to_string(), "Color");
    }
}
