//! Core types for Tabula.
//!
//! This crate provides the building blocks the translator consumes:
//!
//! - `Value` and `DataType`: literal/stored values and their logical types
//! - `DataConverter`: per-Field conversions between declared and stored types
//! - `Entity`, `Property` and friends: an explicit description of a source
//!   type's Field Tree
//! - `Annotation`, `Check`, `ComplexCheck`: constraint declarations
//! - `Settings`: translation options
//! - `TranslationError`: the structured diagnostics model

pub mod annotation;
pub mod convert;
pub mod entity;
pub mod error;
pub mod settings;
pub mod types;
pub mod value;

pub use annotation::{Annotation, Check, ComplexCheck, PathSpec, RepeatPolicy};
pub use convert::{ConversionError, DataConversion, DataConverter};
pub use entity::{
    Aggregate, Entity, Property, PropertyKind, Reference, Relation, RelationShape, Scalar,
};
pub use error::{ConfigError, Error, ErrorKind, Location, Result, TranslationError};
pub use settings::Settings;
pub use types::{DataType, EnumType};
pub use value::{Enumerator, Value};
