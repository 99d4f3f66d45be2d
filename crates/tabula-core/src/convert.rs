//! Data converters between a Field's declared type and its stored type.
//!
//! A converter is attached to a single Field. Anchors and defaults are
//! written in the converter's *source* type and converted to its *result*
//! type before they reach a constraint.

use std::fmt;
use std::sync::Arc;

use crate::types::{DataType, EnumType};
use crate::value::Value;

/// Error raised by a data conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub message: String,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConversionError {}

/// A bidirectional transformation between two logical types.
pub trait DataConversion: fmt::Debug + Send + Sync {
    /// Type written in the data model.
    fn source_type(&self) -> &DataType;

    /// Type actually persisted.
    fn result_type(&self) -> &DataType;

    /// Convert a source value into the stored representation.
    fn convert(&self, value: &Value) -> Result<Value, ConversionError>;

    /// Recover a source value from its stored representation.
    fn revert(&self, value: &Value) -> Result<Value, ConversionError>;
}

/// Shared handle to a data conversion.
#[derive(Clone)]
pub struct DataConverter(Arc<dyn DataConversion>);

impl DataConverter {
    /// Wrap a custom conversion.
    pub fn new(conversion: impl DataConversion + 'static) -> Self {
        Self(Arc::new(conversion))
    }

    /// Store an enumeration as the name of its enumerator.
    pub fn enum_to_string(enumeration: EnumType) -> Self {
        Self::new(EnumToString {
            source: DataType::Enumeration(enumeration),
            result: DataType::Text,
        })
    }

    /// Store an enumeration as the position of its enumerator.
    ///
    /// Returns `None` if `numeric` is not an integer type.
    pub fn enum_to_numeric(enumeration: EnumType, numeric: DataType) -> Option<Self> {
        numeric.is_integer().then(|| {
            Self::new(EnumToNumeric {
                source: DataType::Enumeration(enumeration),
                result: numeric,
            })
        })
    }

    /// Range-checked conversion between two numeric types.
    ///
    /// Returns `None` if either type is not numeric.
    pub fn numeric_cast(source: DataType, result: DataType) -> Option<Self> {
        (source.is_numeric() && result.is_numeric())
            .then(|| Self::new(NumericCast { source, result }))
    }

    /// Conversion defined by a pair of functions.
    pub fn from_fns<C, R>(source: DataType, result: DataType, convert: C, revert: R) -> Self
    where
        C: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
        R: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Self::new(FnConversion {
            source,
            result,
            convert: Box::new(convert),
            revert: Box::new(revert),
        })
    }

    pub fn source_type(&self) -> &DataType {
        self.0.source_type()
    }

    pub fn result_type(&self) -> &DataType {
        self.0.result_type()
    }

    /// Convert a source value, passing the null-marker through unchanged.
    pub fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let converted = self.0.convert(value)?;
        if !converted.is_of_type(self.result_type()) {
            return Err(ConversionError::new(format!(
                "converter produced {converted} of type {}, not {} as declared",
                converted.type_name(),
                self.result_type()
            )));
        }
        Ok(converted)
    }

    /// Revert a stored value, passing the null-marker through unchanged.
    pub fn revert(&self, value: &Value) -> Result<Value, ConversionError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.0.revert(value)
    }
}

impl fmt::Debug for DataConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataConverter({:?})", self.0)
    }
}

#[derive(Debug)]
struct EnumToString {
    source: DataType,
    result: DataType,
}

impl EnumToString {
    fn enumeration(&self) -> Option<&EnumType> {
        match &self.source {
            DataType::Enumeration(e) => Some(e),
            _ => None,
        }
    }
}

impl DataConversion for EnumToString {
    fn source_type(&self) -> &DataType {
        &self.source
    }

    fn result_type(&self) -> &DataType {
        &self.result
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        match value {
            Value::Enum(e) if self.enumeration().is_some_and(|t| t.contains(&e.name)) => {
                Ok(Value::Text(e.name.clone()))
            }
            other => Err(ConversionError::new(format!(
                "{other} is not an enumerator of {}",
                self.source
            ))),
        }
    }

    fn revert(&self, value: &Value) -> Result<Value, ConversionError> {
        match (value, self.enumeration()) {
            (Value::Text(name), Some(t)) if t.contains(name) => {
                Ok(Value::enumerator(t.name.clone(), name.clone()))
            }
            (other, _) => Err(ConversionError::new(format!(
                "{other} does not name an enumerator of {}",
                self.source
            ))),
        }
    }
}

#[derive(Debug)]
struct EnumToNumeric {
    source: DataType,
    result: DataType,
}

impl DataConversion for EnumToNumeric {
    fn source_type(&self) -> &DataType {
        &self.source
    }

    fn result_type(&self) -> &DataType {
        &self.result
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        let DataType::Enumeration(enumeration) = &self.source else {
            return Err(ConversionError::new("source type is not an enumeration"));
        };
        let position = match value {
            Value::Enum(e) => enumeration.position(&e.name),
            _ => None,
        };
        position
            .and_then(|p| Value::integer(&self.result, p as i128))
            .ok_or_else(|| {
                ConversionError::new(format!("{value} cannot be stored as {}", self.result))
            })
    }

    fn revert(&self, value: &Value) -> Result<Value, ConversionError> {
        let DataType::Enumeration(enumeration) = &self.source else {
            return Err(ConversionError::new("source type is not an enumeration"));
        };
        value
            .as_i128()
            .and_then(|n| usize::try_from(n).ok())
            .and_then(|n| enumeration.enumerators.get(n))
            .map(|name| Value::enumerator(enumeration.name.clone(), name.clone()))
            .ok_or_else(|| {
                ConversionError::new(format!(
                    "{value} is not the position of an enumerator of {}",
                    self.source
                ))
            })
    }
}

#[derive(Debug)]
struct NumericCast {
    source: DataType,
    result: DataType,
}

impl DataConversion for NumericCast {
    fn source_type(&self) -> &DataType {
        &self.source
    }

    fn result_type(&self) -> &DataType {
        &self.result
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        Value::numeric(&self.result, value).ok_or_else(|| {
            ConversionError::new(format!("{value} is outside the range of {}", self.result))
        })
    }

    fn revert(&self, value: &Value) -> Result<Value, ConversionError> {
        Value::numeric(&self.source, value).ok_or_else(|| {
            ConversionError::new(format!("{value} is outside the range of {}", self.source))
        })
    }
}

type ConvertFn = Box<dyn Fn(&Value) -> Result<Value, ConversionError> + Send + Sync>;

struct FnConversion {
    source: DataType,
    result: DataType,
    convert: ConvertFn,
    revert: ConvertFn,
}

impl fmt::Debug for FnConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConversion")
            .field("source", &self.source)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl DataConversion for FnConversion {
    fn source_type(&self) -> &DataType {
        &self.source
    }

    fn result_type(&self) -> &DataType {
        &self.result
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        (self.convert)(value)
    }

    fn revert(&self, value: &Value) -> Result<Value, ConversionError> {
        (self.revert)(value)
    }
}
