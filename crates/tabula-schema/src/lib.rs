//! Constraint translation for Tabula.
//!
//! This crate turns an annotated [`Entity`](tabula_core::Entity) into
//! tables of flattened Fields carrying CHECK constraints:
//!
//! - `path`: resolves annotation paths through aggregates, references and
//!   relations
//! - `applicable`: type gates for each constraint kind
//! - `anchor`: converts annotation literals into stored values
//! - `bounds`: combines constraints per Field (tightest bound wins)
//! - `generator`: registry of custom CHECK generators
//! - `clause`: the CHECK clause model and its SQL rendering
//! - `table`: the translation output
//! - `translate`: the driver

mod anchor;
mod applicable;
mod bounds;
pub mod clause;
pub mod generator;
pub mod path;
pub mod table;
pub mod translate;

pub use clause::{CheckConstraint, Clause, ComparisonOperator, InclusionOperator, Operand};
pub use generator::{BoxError, CheckGenerator, GeneratorRegistry, Param};
pub use table::{Field, Table, Translation};
pub use translate::Translator;
