//! Tabula - object-relational schema translation with declarative CHECK
//! constraints.
//!
//! Tabula takes an explicit description of a data model type (an
//! [`Entity`] with scalar, aggregate, reference and relation properties),
//! validates the constraint annotations attached to it, and produces the
//! relational tables that store it, each with its CHECK constraints.
//!
//! # Quick Start
//!
//! ```
//! use tabula::prelude::*;
//!
//! let font = Entity::new("Font")
//!     .primary_key(["ID"])
//!     .property(Property::new("ID", DataType::U32))
//!     .property(Property::new("Range", DataType::U16).check(Check::IsGreaterThan(Value::U16(0))))
//!     .property(
//!         Property::new("Family", DataType::Text)
//!             .check(Check::IsNonEmpty)
//!             .check(Check::LengthIsAtMost(64)),
//!     );
//!
//! let translation = tabula::translate(&font).unwrap();
//! let checks: Vec<String> =
//!     translation.principal.checks.iter().map(ToString::to_string).collect();
//! assert_eq!(
//!     checks,
//!     vec![
//!         r#"CHECK ("Range" > 0)"#,
//!         r#"CHECK (LENGTH("Family") >= 1)"#,
//!         r#"CHECK (LENGTH("Family") <= 64)"#,
//!     ]
//! );
//! ```
//!
//! Invalid declarations fail with a located diagnostic:
//!
//! ```
//! use tabula::prelude::*;
//!
//! let font = Entity::new("Font").property(
//!     Property::new("HasSerifs", DataType::Bool).check(Check::IsGreaterThan(Value::Bool(false))),
//! );
//!
//! let err = tabula::translate(&font).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Translation error: InapplicableAnnotation at `Font` → HasSerifs [IsGreaterThan]: \
//!      IsGreaterThan cannot be applied to a Field of non-orderable type bool"
//! );
//! ```

pub use tabula_core::{
    Aggregate, Annotation, Check, ComplexCheck, ConfigError, ConversionError, DataConversion,
    DataConverter, DataType, EnumType, Entity, Enumerator, Error, ErrorKind, Location, PathSpec,
    Property, PropertyKind, Reference, Relation, RelationShape, RepeatPolicy, Result, Scalar,
    Settings, TranslationError, Value,
};

pub use tabula_schema::{
    BoxError, CheckConstraint, CheckGenerator, Clause, ComparisonOperator, Field,
    GeneratorRegistry, InclusionOperator, Operand, Param, Table, Translation, Translator,
};

/// Translate an entity with default settings and no custom generators.
pub fn translate(entity: &Entity) -> Result<Translation> {
    let registry = GeneratorRegistry::new();
    Ok(Translator::new(&registry).translate(entity)?)
}

/// Render a translation as pretty-printed JSON.
///
/// Translations are deterministic, so the output is suitable for
/// snapshots.
pub fn to_json(translation: &Translation) -> Result<String> {
    let json = serde_json::to_string_pretty(translation)?;
    tracing::trace!(source = %translation.source, bytes = json.len(), "serialized translation");
    Ok(json)
}

/// List every CHECK constraint as `<table>: <constraint>`, principal table
/// first.
pub fn check_summary(translation: &Translation) -> Vec<String> {
    translation
        .tables()
        .flat_map(|table| {
            table
                .checks
                .iter()
                .map(move |check| format!("{}: {check}", table.name))
        })
        .collect()
}

/// Prelude module for convenient imports.
///
/// ```
/// use tabula::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Aggregate, Annotation, Check, CheckGenerator, Clause, ComplexCheck, DataConverter,
        DataType, EnumType, Entity, Error, ErrorKind, Field, GeneratorRegistry, Operand, Param,
        PathSpec, Property, Reference, Relation, Result, Scalar, Settings, Translation,
        TranslationError, Translator, Value,
    };
}
