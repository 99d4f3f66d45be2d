//! Declarative constraint annotations.
//!
//! An [`Annotation`] is attached to a property of the data model and names a
//! [`Check`] plus an optional path into the property's nested structure.
//! Entity-wide checks over several fields are expressed with
//! [`ComplexCheck`].

use crate::value::Value;

/// Whether a check kind may be applied more than once by one property to
/// the same Field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPolicy {
    /// Repeated applications are combined (tightest bound wins, or values
    /// accumulate).
    Combine,
    /// Repeated applications are an error.
    Reject,
}

/// A single constraint kind with its anchor(s).
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    IsGreaterThan(Value),
    IsLessThan(Value),
    IsGreaterOrEqualTo(Value),
    IsLessOrEqualTo(Value),
    IsNot(Value),
    IsOneOf(Vec<Value>),
    IsNotOneOf(Vec<Value>),
    IsPositive,
    IsNegative,
    IsNonZero,
    IsNonEmpty,
    LengthIsAtLeast(i64),
    LengthIsAtMost(i64),
    LengthIsBetween(i64, i64),
    /// A user-supplied generator, looked up by identifier
    Custom {
        generator: String,
        args: Vec<Value>,
        name: Option<String>,
    },
}

/// Groups of kinds that may not target the same Field from one property.
const EXCLUSIVE: &[(&str, &str)] = &[
    ("IsPositive", "IsNegative"),
    ("IsNonEmpty", "LengthIsAtLeast"),
    ("IsOneOf", "IsNotOneOf"),
];

impl Check {
    /// Create a custom check backed by a registered generator.
    pub fn custom<I>(generator: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Check::Custom {
            generator: generator.into(),
            args: args.into_iter().collect(),
            name: None,
        }
    }

    /// Name of the annotation, as reported in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Check::IsGreaterThan(_) => "IsGreaterThan",
            Check::IsLessThan(_) => "IsLessThan",
            Check::IsGreaterOrEqualTo(_) => "IsGreaterOrEqualTo",
            Check::IsLessOrEqualTo(_) => "IsLessOrEqualTo",
            Check::IsNot(_) => "IsNot",
            Check::IsOneOf(_) => "IsOneOf",
            Check::IsNotOneOf(_) => "IsNotOneOf",
            Check::IsPositive => "IsPositive",
            Check::IsNegative => "IsNegative",
            Check::IsNonZero => "IsNonZero",
            Check::IsNonEmpty => "IsNonEmpty",
            Check::LengthIsAtLeast(_) => "LengthIsAtLeast",
            Check::LengthIsAtMost(_) => "LengthIsAtMost",
            Check::LengthIsBetween(_, _) => "LengthIsBetween",
            Check::Custom { .. } => "Check",
        }
    }

    /// How repeated applications of this kind are treated.
    pub const fn repeat_policy(&self) -> RepeatPolicy {
        match self {
            Check::IsGreaterThan(_)
            | Check::IsLessThan(_)
            | Check::IsOneOf(_)
            | Check::IsNotOneOf(_) => RepeatPolicy::Reject,
            _ => RepeatPolicy::Combine,
        }
    }

    /// Check if two kinds are mutually exclusive on one target.
    pub fn excludes(&self, other: &Check) -> bool {
        self.excludes_kind(other.name())
    }

    /// Check if this kind is mutually exclusive with the kind named `other`.
    pub fn excludes_kind(&self, other: &str) -> bool {
        let name = self.name();
        EXCLUSIVE
            .iter()
            .any(|&(x, y)| (x == name && y == other) || (x == other && y == name))
    }

    /// Check if this kind may target an aggregate or reference as a whole.
    pub const fn is_whole_container(&self) -> bool {
        matches!(self, Check::Custom { .. })
    }

    /// Check if this kind is from the string-length family.
    pub const fn is_length(&self) -> bool {
        matches!(
            self,
            Check::IsNonEmpty
                | Check::LengthIsAtLeast(_)
                | Check::LengthIsAtMost(_)
                | Check::LengthIsBetween(_, _)
        )
    }
}

/// Path argument of an annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PathSpec {
    /// No path: the annotation targets the property itself
    #[default]
    Unspecified,
    /// The explicit null-marker, which is never a valid path
    Null,
    /// A dotted (or slashed) path of property names
    Path(String),
}

impl PathSpec {
    /// The path text, if one was given.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PathSpec::Path(p) => Some(p),
            _ => None,
        }
    }
}

/// A constraint declaration on a property.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub check: Check,
    pub path: PathSpec,
}

impl Annotation {
    /// Annotate the property itself.
    pub fn new(check: Check) -> Self {
        Self {
            check,
            path: PathSpec::Unspecified,
        }
    }

    /// Annotate a nested Field reached through `path`.
    pub fn at(path: impl Into<String>, check: Check) -> Self {
        Self {
            check,
            path: PathSpec::Path(path.into()),
        }
    }

    /// Annotate with the explicit null path.
    pub fn null_path(check: Check) -> Self {
        Self {
            check,
            path: PathSpec::Null,
        }
    }

    /// Name of the annotation, as reported in diagnostics.
    pub fn name(&self) -> &'static str {
        self.check.name()
    }
}

impl From<Check> for Annotation {
    fn from(check: Check) -> Self {
        Self::new(check)
    }
}

/// An entity-level check over one or more Fields, named by their current
/// (possibly renamed) Field names.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexCheck {
    pub generator: String,
    pub fields: Vec<String>,
    pub args: Vec<Value>,
    pub name: Option<String>,
}

impl ComplexCheck {
    /// Create a complex check backed by a registered generator.
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
            fields: Vec::new(),
            args: Vec::new(),
            name: None,
        }
    }

    /// Add a Field argument.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Add a constructor argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Name the emitted constraint.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
