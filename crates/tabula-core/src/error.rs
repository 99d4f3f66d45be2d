//! Error types for Tabula translations.

use std::fmt;

/// The primary error type for all Tabula operations.
#[derive(Debug)]
pub enum Error {
    /// A data model could not be translated
    Translation(TranslationError),
    /// Configuration errors (settings, generator registration)
    Config(ConfigError),
    /// Serialization/deserialization errors
    Serde(String),
}

/// Where in a data model a translation error was found.
///
/// Rendered as `` `Type` → Property → path `` or, for properties that live
/// in a relation table, `` `Type` → <synthetic> `Relation` → path ``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Source type being translated
    pub type_name: String,
    /// Top-level property, if the error is not entity-wide
    pub property: Option<String>,
    /// Whether `property` is a relation, reported as synthetic
    pub synthetic: bool,
    /// Nested path below the property
    pub path: Option<String>,
}

impl Location {
    /// Location of an entity-wide declaration.
    pub fn entity(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            property: None,
            synthetic: false,
            path: None,
        }
    }

    /// Location of a top-level property.
    pub fn property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            ..Self::entity(type_name)
        }
    }

    /// Location of a relation property.
    pub fn relation(type_name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::property(type_name, relation)
        }
    }

    /// Extend the nested path by one or more segments.
    pub fn nested(mut self, segment: impl AsRef<str>) -> Self {
        let segment = segment.as_ref();
        if segment.is_empty() {
            return self;
        }
        self.path = Some(match self.path.take() {
            Some(path) => format!("{path}.{segment}"),
            None => segment.to_string(),
        });
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.type_name)?;
        if let Some(property) = &self.property {
            if self.synthetic {
                write!(f, " → <synthetic> `{property}`")?;
            } else {
                write!(f, " → {property}")?;
            }
        }
        if let Some(path) = &self.path {
            write!(f, " → {path}")?;
        }
        Ok(())
    }
}

/// The closed set of translation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Annotation kind does not fit the target's type or shape
    InapplicableAnnotation,
    /// Path is null or does not resolve to a Field
    InvalidPath,
    /// An anchor fails type matching, parsing, range or sentinel checks
    InvalidConstraintValue,
    /// A constraint's own parameters contradict each other
    UnsatisfiableConstraint,
    /// A custom generator cannot be found or constructed
    InvalidCustomConstraint,
    /// A custom generator failed while generating its clause
    FailedOperation,
    /// A declared default violates one of the Field's constraints
    InvalidatedDefault,
    /// A complex check names a Field that does not exist
    UnrecognizedField,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InapplicableAnnotation => "InapplicableAnnotation",
            ErrorKind::InvalidPath => "InvalidPath",
            ErrorKind::InvalidConstraintValue => "InvalidConstraintValue",
            ErrorKind::UnsatisfiableConstraint => "UnsatisfiableConstraint",
            ErrorKind::InvalidCustomConstraint => "InvalidCustomConstraint",
            ErrorKind::FailedOperation => "FailedOperation",
            ErrorKind::InvalidatedDefault => "InvalidatedDefault",
            ErrorKind::UnrecognizedField => "UnrecognizedField",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-located translation failure.
#[derive(Debug)]
pub struct TranslationError {
    pub kind: ErrorKind,
    pub location: Location,
    /// Implicated annotations, in declaration order
    pub annotations: Vec<String>,
    /// One-line problem statement
    pub problem: String,
    pub details: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TranslationError {
    pub fn new(kind: ErrorKind, location: Location, problem: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            annotations: Vec::new(),
            problem: problem.into(),
            details: None,
            source: None,
        }
    }

    /// Name an implicated annotation.
    pub fn annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    /// Attach supporting details.
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach the underlying error.
    pub fn source(mut self, source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.location)?;
        if !self.annotations.is_empty() {
            write!(f, " [{}]", self.annotations.join(", "))?;
        }
        write!(f, ": {}", self.problem)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for TranslationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Translation(e) => write!(f, "Translation error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Translation(e) => Some(e),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Serde(_) => None,
        }
    }
}

impl From<TranslationError> for Error {
    fn from(err: TranslationError) -> Self {
        Error::Translation(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for Tabula operations.
pub type Result<T> = std::result::Result<T, Error>;
