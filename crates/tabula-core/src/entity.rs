//! Description of a source type's Field Tree.
//!
//! The front end that discovers properties of a data model type hands the
//! translator an [`Entity`]: a tree of properties whose leaves are
//! [`Scalar`]s and whose inner nodes are aggregates (nested value types),
//! references (foreign entities, seen through their primary key) and
//! relations (collections stored in their own table).
//!
//! # Example
//!
//! ```
//! use tabula_core::{Check, DataType, Entity, Property, Scalar, Value};
//!
//! let font = Entity::new("Font")
//!     .primary_key(["ID"])
//!     .property(Property::new("ID", DataType::U32))
//!     .property(
//!         Property::new("Range", DataType::U16).check(Check::IsGreaterThan(Value::U16(0))),
//!     )
//!     .property(Property::new("Family", Scalar::new(DataType::Text).nullable(true)));
//!
//! assert_eq!(font.properties.len(), 3);
//! ```

use crate::annotation::{Annotation, Check, ComplexCheck};
use crate::convert::DataConverter;
use crate::types::DataType;
use crate::value::Value;

/// A leaf property: one storage Field.
#[derive(Debug, Clone)]
pub struct Scalar {
    /// Declared type (the converter's source type, if one is attached)
    pub data_type: DataType,
    pub nullable: bool,
    pub converter: Option<DataConverter>,
    /// Declared default, in the declared type
    pub default: Option<Value>,
}

impl Scalar {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            nullable: false,
            converter: None,
            default: None,
        }
    }

    /// Set nullable flag.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Attach a data converter.
    pub fn converter(mut self, converter: DataConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Set the declared default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Type actually persisted, after any data conversion.
    pub fn stored_type(&self) -> &DataType {
        self.converter
            .as_ref()
            .map_or(&self.data_type, DataConverter::result_type)
    }
}

/// A value type nested inline; its Fields are flattened into the owner.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub type_name: String,
    pub members: Vec<Property>,
    pub nullable: bool,
}

impl Aggregate {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
            nullable: false,
        }
    }

    /// Add a member property.
    pub fn member(mut self, property: Property) -> Self {
        self.members.push(property);
        self
    }

    /// Set nullable flag.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }
}

/// A foreign entity, stored as its primary key.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Name of the referenced entity
    pub entity: String,
    /// The referenced entity's primary-key properties
    pub key: Vec<Property>,
    pub nullable: bool,
}

impl Reference {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            key: Vec::new(),
            nullable: false,
        }
    }

    /// Add a primary-key property of the referenced entity.
    pub fn key(mut self, property: Property) -> Self {
        self.key.push(property);
        self
    }

    /// Set nullable flag.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }
}

/// Shape of a collection-valued property.
#[derive(Debug, Clone)]
pub enum RelationShape {
    /// Ordered sequence: `Index` and `Item` Fields
    List(Box<PropertyKind>),
    /// Unordered collection: `Item` Field
    Set(Box<PropertyKind>),
    /// Associative collection: `Key` and `Value` Fields
    Map {
        key: Box<PropertyKind>,
        value: Box<PropertyKind>,
    },
}

/// A collection-valued property, stored in its own table.
#[derive(Debug, Clone)]
pub struct Relation {
    pub shape: RelationShape,
}

impl Relation {
    pub fn list(item: impl Into<PropertyKind>) -> Self {
        Self {
            shape: RelationShape::List(Box::new(item.into())),
        }
    }

    pub fn set(item: impl Into<PropertyKind>) -> Self {
        Self {
            shape: RelationShape::Set(Box::new(item.into())),
        }
    }

    pub fn map(key: impl Into<PropertyKind>, value: impl Into<PropertyKind>) -> Self {
        Self {
            shape: RelationShape::Map {
                key: Box::new(key.into()),
                value: Box::new(value.into()),
            },
        }
    }

    /// The synthetic element slots of this relation, in storage order.
    pub fn elements(&self) -> Vec<(&'static str, &PropertyKind)> {
        match &self.shape {
            RelationShape::List(item) | RelationShape::Set(item) => vec![("Item", item.as_ref())],
            RelationShape::Map { key, value } => {
                vec![("Key", key.as_ref()), ("Value", value.as_ref())]
            }
        }
    }

    /// Check if this relation carries an `Index` Field.
    pub const fn is_ordered(&self) -> bool {
        matches!(self.shape, RelationShape::List(_))
    }
}

/// What a property holds.
#[derive(Debug, Clone)]
pub enum PropertyKind {
    Scalar(Scalar),
    Aggregate(Aggregate),
    Reference(Reference),
    Relation(Relation),
}

impl PropertyKind {
    /// Short description for diagnostics, e.g. "aggregate type `Style`".
    pub fn describe(&self) -> String {
        match self {
            PropertyKind::Scalar(s) => format!("scalar type {}", s.data_type),
            PropertyKind::Aggregate(a) => format!("aggregate type `{}`", a.type_name),
            PropertyKind::Reference(r) => format!("reference type `{}`", r.entity),
            PropertyKind::Relation(_) => "relation type".to_string(),
        }
    }
}

impl From<Scalar> for PropertyKind {
    fn from(s: Scalar) -> Self {
        PropertyKind::Scalar(s)
    }
}

impl From<DataType> for PropertyKind {
    fn from(t: DataType) -> Self {
        PropertyKind::Scalar(Scalar::new(t))
    }
}

impl From<Aggregate> for PropertyKind {
    fn from(a: Aggregate) -> Self {
        PropertyKind::Aggregate(a)
    }
}

impl From<Reference> for PropertyKind {
    fn from(r: Reference) -> Self {
        PropertyKind::Reference(r)
    }
}

impl From<Relation> for PropertyKind {
    fn from(r: Relation) -> Self {
        PropertyKind::Relation(r)
    }
}

/// A named property with its annotations.
#[derive(Debug, Clone)]
pub struct Property {
    /// Name in the source type; paths are written with these names
    pub name: String,
    /// Storage name, if renamed
    pub rename: Option<String>,
    pub kind: PropertyKind,
    pub annotations: Vec<Annotation>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: impl Into<PropertyKind>) -> Self {
        Self {
            name: name.into(),
            rename: None,
            kind: kind.into(),
            annotations: Vec::new(),
        }
    }

    /// Store this property under a different name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    /// Annotate the property itself.
    pub fn check(self, check: Check) -> Self {
        self.annotate(Annotation::new(check))
    }

    /// Annotate a nested Field reached through `path`.
    pub fn check_at(self, path: impl Into<String>, check: Check) -> Self {
        self.annotate(Annotation::at(path, check))
    }

    /// Add an annotation.
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Storage name: the rename if any, else the source name.
    pub fn current_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

/// A source type translated into one principal table.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub properties: Vec<Property>,
    /// Source names of the primary-key properties
    pub primary_key: Vec<String>,
    pub checks: Vec<ComplexCheck>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            primary_key: Vec::new(),
            checks: Vec::new(),
        }
    }

    /// Add a property.
    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Set the primary-key properties by source name.
    pub fn primary_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Add an entity-level check.
    pub fn check(mut self, check: ComplexCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Find a property by source name.
    pub fn find(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The primary-key properties, in key order.
    pub fn key_properties(&self) -> impl Iterator<Item = &Property> {
        self.primary_key.iter().filter_map(|name| self.find(name))
    }
}
