//! Translation output: tables of flattened Fields plus their CHECK
//! constraints.

use serde::Serialize;
use tabula_core::{DataConverter, DataType, Entity, Location, PropertyKind, Value};

use crate::clause::CheckConstraint;

/// A leaf storage column.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    /// Qualified name (e.g. `Style.Weight`)
    pub name: String,
    /// Type written in the data model
    pub data_type: DataType,
    /// Type actually persisted
    pub stored_type: DataType,
    pub nullable: bool,
    #[serde(skip)]
    pub converter: Option<DataConverter>,
    /// Declared default, in the declared type
    pub default: Option<Value>,
    /// Where the Field was declared, for diagnostics
    #[serde(skip)]
    pub origin: Location,
}

impl Field {
    /// Convert a declared-type value into the stored representation.
    pub fn to_stored(&self, value: &Value) -> Result<Value, tabula_core::ConversionError> {
        match &self.converter {
            Some(converter) => converter.convert(value),
            None => Ok(value.clone()),
        }
    }
}

/// A table of the relational model.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub name: String,
    pub fields: Vec<Field>,
    pub checks: Vec<CheckConstraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            checks: Vec::new(),
        }
    }

    /// Get a Field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields at `prefix` or nested below it.
    pub fn fields_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| {
            f.name == prefix
                || f.name
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// The translation of one source type.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    /// Name of the source type
    pub source: String,
    pub principal: Table,
    pub relations: Vec<Table>,
}

impl Translation {
    /// Get a table (principal or relation) by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables().find(|t| t.name == name)
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        if self.principal.name == name {
            return Some(&mut self.principal);
        }
        self.relations.iter_mut().find(|t| t.name == name)
    }

    /// All tables, principal first.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        std::iter::once(&self.principal).chain(self.relations.iter())
    }

    /// Lay out the tables of an entity, without constraints.
    pub(crate) fn layout(entity: &Entity) -> Self {
        let mut layout = Layout {
            entity,
            relations: Vec::new(),
        };
        let mut principal = Table::new(&entity.name);
        for property in &entity.properties {
            let origin = Location::property(&entity.name, &property.name);
            layout.flatten(
                &mut principal.fields,
                &property.kind,
                property.current_name(),
                false,
                &origin,
                false,
            );
        }
        Self {
            source: entity.name.clone(),
            principal,
            relations: layout.relations,
        }
    }
}

/// Name of the table that stores the relation at `prefix`.
pub(crate) fn relation_table_name(entity: &str, prefix: &str) -> String {
    format!("{entity}.{prefix}")
}

/// Join a qualified name and a segment.
pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Source-qualified property name of a location (`Style.Tags`).
pub(crate) fn qualified_property(location: &Location) -> String {
    let property = location.property.as_deref().unwrap_or_default();
    match &location.path {
        Some(path) => join(property, path),
        None => property.to_string(),
    }
}

struct Layout<'a> {
    entity: &'a Entity,
    relations: Vec<Table>,
}

impl Layout<'_> {
    fn flatten(
        &mut self,
        fields: &mut Vec<Field>,
        kind: &PropertyKind,
        name: &str,
        nullable: bool,
        origin: &Location,
        in_relation: bool,
    ) {
        match kind {
            PropertyKind::Scalar(scalar) => fields.push(Field {
                name: name.to_string(),
                data_type: scalar.data_type.clone(),
                stored_type: scalar.stored_type().clone(),
                nullable: nullable || scalar.nullable,
                converter: scalar.converter.clone(),
                default: scalar.default.clone(),
                origin: origin.clone(),
            }),
            PropertyKind::Aggregate(aggregate) => {
                for member in &aggregate.members {
                    self.flatten(
                        fields,
                        &member.kind,
                        &join(name, member.current_name()),
                        nullable || aggregate.nullable,
                        &origin.clone().nested(&member.name),
                        in_relation,
                    );
                }
            }
            PropertyKind::Reference(reference) => {
                for key in &reference.key {
                    self.flatten(
                        fields,
                        &key.kind,
                        &join(name, key.current_name()),
                        nullable || reference.nullable,
                        &origin.clone().nested(&key.name),
                        in_relation,
                    );
                }
            }
            PropertyKind::Relation(relation) => {
                if in_relation {
                    tracing::warn!(
                        entity = %self.entity.name,
                        relation = %name,
                        "relations nested inside relation elements are not supported; skipping"
                    );
                    return;
                }
                let entity = self.entity;
                let location = Location::relation(&entity.name, qualified_property(origin));
                let mut table = Table::new(relation_table_name(&entity.name, name));
                for key in entity.key_properties() {
                    self.flatten(
                        &mut table.fields,
                        &key.kind,
                        &join(&entity.name, key.current_name()),
                        false,
                        &location.clone().nested(&entity.name).nested(&key.name),
                        true,
                    );
                }
                if relation.is_ordered() {
                    table.fields.push(Field {
                        name: "Index".to_string(),
                        data_type: DataType::U32,
                        stored_type: DataType::U32,
                        nullable: false,
                        converter: None,
                        default: None,
                        origin: location.clone(),
                    });
                }
                for (slot, element) in relation.elements() {
                    self.flatten(
                        &mut table.fields,
                        element,
                        slot,
                        false,
                        &location.clone().nested(slot),
                        true,
                    );
                }
                self.relations.push(table);
            }
        }
    }
}
