//! Anchor conversion.
//!
//! Anchors are written in the declared type domain (dates and GUIDs as
//! text, decimals as `f64`), checked, parsed into the declared type and
//! finally passed through the Field's data converter.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tabula_core::{DataType, Settings, Value};
use uuid::Uuid;

use crate::clause::ComparisonOperator;
use crate::table::Field;

/// What an anchor is used as; only affects the wording of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Bound of a comparison
    Boundary,
    /// Member of an (in)equality or inclusion set
    Value,
}

impl Role {
    const fn noun(self) -> &'static str {
        match self {
            Role::Boundary => "boundary",
            Role::Value => "value",
        }
    }
}

/// A rejected anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnchorError {
    pub problem: String,
    pub details: Option<String>,
}

impl AnchorError {
    fn new(problem: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            details: None,
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// An accepted anchor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Anchor {
    /// Value in the declared type
    pub declared: Value,
    /// Value in the stored type
    pub stored: Value,
}

/// Convert an anchor literal for `field`.
pub(crate) fn convert(
    literal: &Value,
    field: &Field,
    role: Role,
    settings: &Settings,
) -> Result<Anchor, AnchorError> {
    if literal.is_null() {
        return Err(AnchorError::new(format!(
            "the constraint {} cannot be 'null'",
            role.noun()
        )));
    }
    if literal.is_array() {
        return Err(
            AnchorError::new("value cannot be an array").details(format!("found {literal}"))
        );
    }

    let declared = parse_declared(literal, &field.data_type, settings)?;
    let stored = field.to_stored(&declared).map_err(|err| {
        AnchorError::new(format!(
            "unable to convert {declared} to {}",
            field.stored_type
        ))
        .details(err.message)
    })?;
    Ok(Anchor { declared, stored })
}

/// Convert a declared-type value that needs no literal checks (e.g. zero).
pub(crate) fn convert_declared(declared: Value, field: &Field) -> Result<Anchor, AnchorError> {
    let stored = field.to_stored(&declared).map_err(|err| {
        AnchorError::new(format!(
            "unable to convert {declared} to {}",
            field.stored_type
        ))
        .details(err.message)
    })?;
    Ok(Anchor { declared, stored })
}

/// Reject strict comparisons that no value can satisfy.
pub(crate) fn check_sentinel(
    op: ComparisonOperator,
    anchor: &Anchor,
    declared_type: &DataType,
) -> Result<(), AnchorError> {
    let (sentinel, extreme) = match op {
        ComparisonOperator::Gt => (declared_type.max_value(), "maximum"),
        ComparisonOperator::Lt => (declared_type.min_value(), "minimum"),
        _ => return Ok(()),
    };
    if sentinel.as_ref() == Some(&anchor.declared) {
        return Err(AnchorError::new(format!(
            "the constraint anchor cannot be the {extreme} possible value"
        ))
        .details(format!(
            "{} is the {extreme} value of {declared_type}",
            anchor.declared
        )));
    }
    Ok(())
}

fn mismatch(literal: &Value, expected: &DataType) -> AnchorError {
    AnchorError::new(format!(
        "value {literal} is of type {}, not {expected} as expected",
        literal.type_name()
    ))
}

fn parse_declared(
    literal: &Value,
    declared: &DataType,
    settings: &Settings,
) -> Result<Value, AnchorError> {
    let written = declared.literal_type();
    match declared {
        DataType::Date => parse_text(literal, declared, |s| {
            NaiveDate::parse_from_str(s, &settings.date_format)
                .map(Value::Date)
                .map_err(|_| format!("expected format {}", settings.date_format))
        }),
        DataType::DateTime => parse_text(literal, declared, |s| {
            NaiveDateTime::parse_from_str(s, &settings.datetime_format)
                .map(Value::DateTime)
                .map_err(|_| format!("expected format {}", settings.datetime_format))
        }),
        DataType::Guid => parse_text(literal, declared, |s| {
            Uuid::parse_str(s).map(Value::Guid).map_err(|e| e.to_string())
        }),
        DataType::Decimal => {
            let Value::F64(f) = literal else {
                return Err(mismatch(literal, &written));
            };
            Decimal::from_f64(*f).map(Value::Decimal).ok_or_else(|| {
                AnchorError::new(format!(
                    "value {literal} is outside the supported range for decimal"
                ))
            })
        }
        DataType::Enumeration(enumeration) => {
            let Value::Enum(enumerator) = literal else {
                return Err(mismatch(literal, declared));
            };
            if enumerator.type_name != enumeration.name {
                return Err(mismatch(literal, declared));
            }
            if !enumeration.contains(&enumerator.name) {
                return Err(AnchorError::new(format!(
                    "enumerator {literal} is not defined"
                ))
                .details(format!(
                    "{} defines {}",
                    enumeration.name,
                    enumeration.enumerators.join(", ")
                )));
            }
            Ok(literal.clone())
        }
        _ => {
            if !literal.is_of_type(&written) {
                return Err(mismatch(literal, &written));
            }
            if literal.as_f64().is_some_and(f64::is_nan) {
                return Err(AnchorError::new(format!("value {literal} is not a number")));
            }
            Ok(literal.clone())
        }
    }
}

fn parse_text(
    literal: &Value,
    declared: &DataType,
    parse: impl FnOnce(&str) -> Result<Value, String>,
) -> Result<Value, AnchorError> {
    let problem = format!("unable to parse {literal} as a {declared}");
    let Some(text) = literal.as_str() else {
        return Err(AnchorError::new(problem).details("a string is required"));
    };
    parse(text).map_err(|details| AnchorError::new(problem).details(details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{DataConverter, EnumType, Location};

    fn field(data_type: DataType) -> Field {
        Field {
            name: "F".into(),
            stored_type: data_type.clone(),
            data_type,
            nullable: false,
            converter: None,
            default: None,
            origin: Location::property("T", "F"),
        }
    }

    fn run(literal: Value, data_type: DataType) -> Result<Anchor, AnchorError> {
        convert(&literal, &field(data_type), Role::Boundary, &Settings::default())
    }

    #[test]
    fn test_null_and_arrays() {
        let err = run(Value::Null, DataType::I32).unwrap_err();
        assert_eq!(err.problem, "the constraint boundary cannot be 'null'");
        let err = convert(&Value::Null, &field(DataType::I32), Role::Value, &Settings::default())
            .unwrap_err();
        assert_eq!(err.problem, "the constraint value cannot be 'null'");
        let err = run(Value::from(vec![1_i32]), DataType::I32).unwrap_err();
        assert_eq!(err.problem, "value cannot be an array");
    }

    #[test]
    fn test_exact_type_match() {
        let err = run(Value::I32(5), DataType::U64).unwrap_err();
        assert_eq!(err.problem, "value 5 is of type i32, not u64 as expected");
        assert_eq!(run(Value::U64(5), DataType::U64).unwrap().stored, Value::U64(5));
    }

    #[test]
    fn test_temporal_anchors() {
        let anchor = run(Value::from("2024-02-29"), DataType::Date).unwrap();
        assert_eq!(
            anchor.stored,
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );

        let err = run(Value::from("2023-02-29"), DataType::Date).unwrap_err();
        assert!(err.problem.contains("\"2023-02-29\""));

        let err = run(Value::I32(20240229), DataType::Date).unwrap_err();
        assert_eq!(err.details.as_deref(), Some("a string is required"));

        let settings = Settings::default().datetime_format("%d/%m/%Y %H:%M");
        let anchor = convert(
            &Value::from("01/02/2020 10:30"),
            &field(DataType::DateTime),
            Role::Boundary,
            &settings,
        )
        .unwrap();
        assert!(matches!(anchor.stored, Value::DateTime(_)));
    }

    #[test]
    fn test_guid_anchor() {
        let anchor = run(
            Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8"),
            DataType::Guid,
        )
        .unwrap();
        assert!(matches!(anchor.stored, Value::Guid(_)));
        assert!(run(Value::from("not-a-guid"), DataType::Guid).is_err());
    }

    #[test]
    fn test_decimal_range() {
        let anchor = run(Value::F64(12.5), DataType::Decimal).unwrap();
        assert_eq!(anchor.stored, Value::Decimal(Decimal::new(125, 1)));
        let err = run(Value::F64(f64::INFINITY), DataType::Decimal).unwrap_err();
        assert_eq!(
            err.problem,
            "value inf is outside the supported range for decimal"
        );
        assert!(run(Value::F64(1e40), DataType::Decimal).is_err());
        let err = run(Value::I32(1), DataType::Decimal).unwrap_err();
        assert_eq!(err.problem, "value 1 is of type i32, not f64 as expected");
    }

    #[test]
    fn test_nan_rejected() {
        assert!(run(Value::F64(f64::NAN), DataType::F64).is_err());
    }

    #[test]
    fn test_converter_applies_to_source_type() {
        let color = EnumType::new("Color", ["Red", "Green"]);
        let mut f = field(DataType::Enumeration(color.clone()));
        f.converter = Some(DataConverter::enum_to_string(color));
        f.stored_type = DataType::Text;

        let anchor = convert(
            &Value::enumerator("Color", "Green"),
            &f,
            Role::Value,
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(anchor.stored, Value::Text("Green".into()));

        let err = convert(&Value::from("Green"), &f, Role::Value, &Settings::default())
            .unwrap_err();
        assert_eq!(err.problem, "value \"Green\" is of type String, not Color as expected");

        let err = convert(
            &Value::enumerator("Color", "Purple"),
            &f,
            Role::Value,
            &Settings::default(),
        )
        .unwrap_err();
        assert!(err.problem.contains("not defined"));
    }

    #[test]
    fn test_sentinels() {
        let max = run(Value::U16(u16::MAX), DataType::U16).unwrap();
        let err = check_sentinel(ComparisonOperator::Gt, &max, &DataType::U16).unwrap_err();
        assert_eq!(err.problem, "the constraint anchor cannot be the maximum possible value");
        assert!(check_sentinel(ComparisonOperator::Lte, &max, &DataType::U16).is_ok());

        let min = run(Value::I8(i8::MIN), DataType::I8).unwrap();
        assert!(check_sentinel(ComparisonOperator::Lt, &min, &DataType::I8).is_err());
        assert!(check_sentinel(ComparisonOperator::Gte, &min, &DataType::I8).is_ok());
    }
}
