//! Path resolution over the Field Tree.
//!
//! A path is a sequence of property names (source names, not renames)
//! separated by any of the configured separators, e.g. `Style.Weight` or
//! `Owner/ID`. Resolution starts at the annotated property and is purely
//! structural: aggregates are entered by member name, references only by
//! primary-key member name, and relations by their element slots (`Item`,
//! `Key`, `Value`) or by the owning entity's name for the back-reference.

use std::sync::OnceLock;

use regex::Regex;
use tabula_core::{Entity, PathSpec, PropertyKind, Settings};

use crate::table::{join, relation_table_name};

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
    })
}

/// Check if `name` is a plain identifier.
pub fn is_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// Split a path into segments, rejecting empty or non-identifier segments.
pub fn segments<'p>(path: &'p str, separators: &[char]) -> Option<Vec<&'p str>> {
    let segments: Vec<&str> = path.split(|c| separators.contains(&c)).collect();
    segments
        .iter()
        .all(|s| is_identifier(s))
        .then_some(segments)
}

/// Where an annotation was declared.
#[derive(Debug, Clone)]
pub(crate) struct Scope<'a> {
    /// Table holding the property's Fields
    pub table: String,
    /// Qualified (current) name of the property
    pub prefix: String,
    pub kind: &'a PropertyKind,
    /// Whether the property lives inside a relation element
    pub in_relation: bool,
}

/// What a path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// A single Field
    Field { table: String, name: String },
    /// An aggregate, reference or relation as a whole
    Container {
        table: String,
        prefix: String,
        description: String,
        relation: bool,
    },
}

/// Why a path failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathError {
    /// The explicit null path
    Null,
    /// The path does not name a reachable Field
    Missing(String),
}

/// Resolve an annotation's path starting at the annotated property.
pub(crate) fn resolve(
    entity: &Entity,
    scope: &Scope<'_>,
    path: &PathSpec,
    settings: &Settings,
) -> Result<Target, PathError> {
    let text = match path {
        PathSpec::Unspecified => {
            return Ok(walk(
                entity,
                scope.kind,
                &scope.table,
                scope.prefix.clone(),
                scope.in_relation,
                &[],
            )
            .unwrap_or_else(|| container(scope.kind, &scope.table, &scope.prefix)));
        }
        PathSpec::Null => return Err(PathError::Null),
        PathSpec::Path(text) => text,
    };

    let missing = || PathError::Missing(text.clone());
    let segments = segments(text, &settings.path_separators).ok_or_else(missing)?;
    let target = walk(
        entity,
        scope.kind,
        &scope.table,
        scope.prefix.clone(),
        scope.in_relation,
        &segments,
    )
    .ok_or_else(missing)?;
    tracing::trace!(path = %text, target = ?target, "resolved path");
    Ok(target)
}

fn container(kind: &PropertyKind, table: &str, prefix: &str) -> Target {
    Target::Container {
        table: table.to_string(),
        prefix: prefix.to_string(),
        description: kind.describe(),
        relation: matches!(kind, PropertyKind::Relation(_)),
    }
}

fn walk(
    entity: &Entity,
    kind: &PropertyKind,
    table: &str,
    prefix: String,
    in_relation: bool,
    segments: &[&str],
) -> Option<Target> {
    let Some((head, rest)) = segments.split_first() else {
        return match kind {
            PropertyKind::Scalar(_) => Some(Target::Field {
                table: table.to_string(),
                name: prefix,
            }),
            PropertyKind::Relation(_) if in_relation => None,
            _ => Some(container(kind, table, &prefix)),
        };
    };

    match kind {
        PropertyKind::Scalar(_) => None,
        PropertyKind::Aggregate(aggregate) => {
            let member = aggregate.members.iter().find(|m| m.name == *head)?;
            walk(
                entity,
                &member.kind,
                table,
                join(&prefix, member.current_name()),
                in_relation,
                rest,
            )
        }
        PropertyKind::Reference(reference) => {
            let key = reference.key.iter().find(|k| k.name == *head)?;
            walk(
                entity,
                &key.kind,
                table,
                join(&prefix, key.current_name()),
                in_relation,
                rest,
            )
        }
        PropertyKind::Relation(_) if in_relation => None,
        PropertyKind::Relation(relation) => {
            let relation_table = relation_table_name(&entity.name, &prefix);
            if *head == entity.name {
                return walk_back_reference(entity, &relation_table, rest);
            }
            let (slot, element) = relation
                .elements()
                .into_iter()
                .find(|(slot, _)| slot == head)?;
            walk(entity, element, &relation_table, slot.to_string(), true, rest)
        }
    }
}

fn walk_back_reference(entity: &Entity, table: &str, segments: &[&str]) -> Option<Target> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(Target::Container {
            table: table.to_string(),
            prefix: entity.name.clone(),
            description: format!("reference type `{}`", entity.name),
            relation: false,
        });
    };
    let key = entity.key_properties().find(|k| k.name == *head)?;
    walk(
        entity,
        &key.kind,
        table,
        join(&entity.name, key.current_name()),
        true,
        rest,
    )
}
