//! Registry of custom CHECK constraint generators.
//!
//! Custom (`Check::Custom`) and entity-level (`ComplexCheck`) constraints
//! name a generator by identifier. The registry maps each identifier to one
//! or more factories, each with a fixed parameter list; the first factory
//! whose parameters match the annotation's arguments builds the generator.
//!
//! ```
//! use tabula_schema::clause::{ComparisonOperator, Clause};
//! use tabula_schema::generator::{CheckGenerator, GeneratorRegistry};
//!
//! struct Ordered;
//!
//! impl CheckGenerator for Ordered {
//!     fn generate(
//!         &self,
//!         fields: &[&tabula_schema::Field],
//!         _settings: &tabula_core::Settings,
//!     ) -> Result<Clause, tabula_schema::generator::BoxError> {
//!         let [low, high] = fields else {
//!             return Err("exactly two Fields are required".into());
//!         };
//!         Ok(Clause::fields(&low.name, ComparisonOperator::Lt, &high.name))
//!     }
//! }
//!
//! let mut registry = GeneratorRegistry::new();
//! registry.register("Ordered", vec![], |_| Ok(Ordered)).unwrap();
//! assert!(registry.contains("Ordered"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tabula_core::{ConfigError, DataType, Error, Result, Settings, Value};

use crate::clause::Clause;
use crate::path::is_identifier;
use crate::table::Field;

/// Boxed error returned by generators and their factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Produces the clause of a custom CHECK constraint.
pub trait CheckGenerator: Send + Sync {
    /// Build the clause over `fields`, in argument order (duplicates kept).
    fn generate(
        &self,
        fields: &[&Field],
        settings: &Settings,
    ) -> std::result::Result<Clause, BoxError>;
}

impl<F> CheckGenerator for F
where
    F: Fn(&[&Field], &Settings) -> std::result::Result<Clause, BoxError> + Send + Sync,
{
    fn generate(
        &self,
        fields: &[&Field],
        settings: &Settings,
    ) -> std::result::Result<Clause, BoxError> {
        self(fields, settings)
    }
}

/// A factory parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub data_type: DataType,
    /// Whether the null-marker is accepted
    pub nullable: bool,
}

impl Param {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            nullable: false,
        }
    }

    pub fn nullable(data_type: DataType) -> Self {
        Self {
            data_type,
            nullable: true,
        }
    }

    fn accepts(&self, arg: &Value) -> bool {
        if arg.is_null() {
            return self.nullable;
        }
        arg.is_of_type(&self.data_type)
    }
}

type Factory =
    Box<dyn Fn(&[Value]) -> std::result::Result<Box<dyn CheckGenerator>, BoxError> + Send + Sync>;

struct Constructor {
    params: Vec<Param>,
    factory: Factory,
}

impl Constructor {
    fn matches(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }
}

/// Why a generator could not be built.
#[derive(Debug)]
pub(crate) enum ConstructError {
    Unknown,
    NoMatch,
    Failed(BoxError),
}

/// Render constructor arguments as `{a, b}`.
pub(crate) fn render_args(args: &[Value]) -> String {
    let args: Vec<_> = args.iter().map(ToString::to_string).collect();
    format!("{{{}}}", args.join(", "))
}

/// Generators available to a translator, keyed by identifier.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<String, Vec<Constructor>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `name` taking arguments of the given types.
    ///
    /// Fails if `name` is not an identifier, or if `name` already has a
    /// factory with the same parameter list.
    pub fn register<F, G>(&mut self, name: &str, params: Vec<Param>, factory: F) -> Result<()>
    where
        F: Fn(&[Value]) -> std::result::Result<G, BoxError> + Send + Sync + 'static,
        G: CheckGenerator + 'static,
    {
        if !is_identifier(name) {
            return Err(Error::Config(ConfigError::new(format!(
                "`{name}` is not a valid generator identifier"
            ))));
        }
        let constructors = self.generators.entry(name.to_string()).or_default();
        if constructors.iter().any(|c| c.params == params) {
            return Err(Error::Config(ConfigError::new(format!(
                "`{name}` already has a factory taking ({})",
                params
                    .iter()
                    .map(|p| p.data_type.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))));
        }
        tracing::debug!(generator = name, arity = params.len(), "registered check generator");
        constructors.push(Constructor {
            params,
            factory: Box::new(move |args: &[Value]| {
                factory(args).map(|g| Box::new(g) as Box<dyn CheckGenerator>)
            }),
        });
        Ok(())
    }

    /// Check if a generator is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Names of all registered generators, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    pub(crate) fn construct(
        &self,
        name: &str,
        args: &[Value],
    ) -> std::result::Result<Box<dyn CheckGenerator>, ConstructError> {
        let constructors = self.generators.get(name).ok_or(ConstructError::Unknown)?;
        let constructor = constructors
            .iter()
            .find(|c| c.matches(args))
            .ok_or(ConstructError::NoMatch)?;
        (constructor.factory)(args).map_err(ConstructError::Failed)
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
