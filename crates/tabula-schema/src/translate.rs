//! The translator: walks an entity's annotations and produces its tables.
//!
//! Each annotation goes through the same pipeline, in declaration order:
//!
//! 1. resolve the annotation's path to a Field (or a whole container)
//! 2. gate the constraint kind on the Field's type
//! 3. convert the anchor(s) into the Field's stored type
//! 4. reject forbidden repetitions and mutually exclusive kinds
//! 5. tighten the Field's accumulated bounds
//!
//! The first failure aborts the whole translation.

use std::collections::HashMap;

use tabula_core::{
    Annotation, Check, DataType, Entity, ErrorKind, Location, PropertyKind, RepeatPolicy,
    Settings, TranslationError, Value,
};

use crate::anchor::{self, Anchor, AnchorError, Role};
use crate::applicable::check_applicable;
use crate::bounds::{Bound, Emitted, FieldBounds, dedup};
use crate::clause::{CheckConstraint, ComparisonOperator};
use crate::generator::{ConstructError, GeneratorRegistry, render_args};
use crate::path::{self, PathError, Scope, Target};
use crate::table::{Field, Translation, join, qualified_property, relation_table_name};

/// Annotation name reported for entity-level checks.
const COMPLEX_CHECK: &str = "ComplexCheck";

/// Translates entities into tables with CHECK constraints.
///
/// # Example
///
/// ```
/// use tabula_core::{Check, DataType, Entity, Property, Value};
/// use tabula_schema::{GeneratorRegistry, Translator};
///
/// let font = Entity::new("Font")
///     .property(Property::new("Range", DataType::U16).check(Check::IsGreaterThan(Value::U16(0))));
///
/// let registry = GeneratorRegistry::new();
/// let translation = Translator::new(&registry).translate(&font).unwrap();
/// assert_eq!(translation.principal.checks[0].to_string(), r#"CHECK ("Range" > 0)"#);
/// ```
#[derive(Debug, Clone)]
pub struct Translator<'r> {
    registry: &'r GeneratorRegistry,
    settings: Settings,
}

impl<'r> Translator<'r> {
    pub fn new(registry: &'r GeneratorRegistry) -> Self {
        Self {
            registry,
            settings: Settings::default(),
        }
    }

    /// Use the given settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Translate one entity.
    #[tracing::instrument(level = "debug", skip(self, entity), fields(entity = %entity.name))]
    pub fn translate(&self, entity: &Entity) -> Result<Translation, TranslationError> {
        let mut pass = Pass {
            registry: self.registry,
            settings: &self.settings,
            entity,
            translation: Translation::layout(entity),
            bounds: Vec::new(),
            bounds_index: HashMap::new(),
            applied: HashMap::new(),
            customs: Vec::new(),
            next_scope: 0,
        };

        for property in &entity.properties {
            let location = Location::property(&entity.name, &property.name);
            pass.walk(property, &entity.name, property.current_name(), location, false)?;
        }
        pass.complex_checks()?;
        let translation = pass.finish()?;

        tracing::debug!(
            tables = translation.relations.len() + 1,
            checks = translation.tables().map(|t| t.checks.len()).sum::<usize>(),
            "translated entity"
        );
        Ok(translation)
    }
}

/// Key of a Field: table name and Field name.
type FieldKey = (String, String);

/// State of one translation.
struct Pass<'t, 'e> {
    registry: &'t GeneratorRegistry,
    settings: &'t Settings,
    entity: &'e Entity,
    translation: Translation,
    /// Accumulated bounds, in first-touched order
    bounds: Vec<(FieldKey, FieldBounds)>,
    bounds_index: HashMap<FieldKey, usize>,
    /// Kinds applied by one declaring property to one Field
    applied: HashMap<(usize, FieldKey), Vec<&'static str>>,
    /// Custom and complex constraints, in declaration order
    customs: Vec<(String, CheckConstraint)>,
    next_scope: usize,
}

fn fail(
    kind: ErrorKind,
    location: &Location,
    annotation: &str,
    problem: impl Into<String>,
) -> TranslationError {
    TranslationError::new(kind, location.clone(), problem).annotation(annotation)
}

fn invalid_value(
    location: &Location,
    annotation: &str,
) -> impl Fn(AnchorError) -> TranslationError {
    let location = location.clone();
    let annotation = annotation.to_string();
    move |err| {
        let error = fail(ErrorKind::InvalidConstraintValue, &location, &annotation, err.problem);
        match err.details {
            Some(details) => error.details(details),
            None => error,
        }
    }
}

/// What one annotation contributes to a Field.
enum Contribution {
    Lower(Anchor, bool),
    Upper(Anchor, bool),
    Exclude(Value),
    NotNull,
    OneOf(Vec<Value>),
    NotOneOf(Vec<Value>),
    Length(Option<i64>, Option<i64>),
}

impl<'e> Pass<'_, 'e> {
    fn walk(
        &mut self,
        property: &'e tabula_core::Property,
        table: &str,
        prefix: &str,
        location: Location,
        in_relation: bool,
    ) -> Result<(), TranslationError> {
        let scope_id = self.next_scope;
        self.next_scope += 1;

        let location = match &property.kind {
            PropertyKind::Relation(_) if !in_relation => {
                Location::relation(&self.entity.name, qualified_property(&location))
            }
            _ => location,
        };
        let scope = Scope {
            table: table.to_string(),
            prefix: prefix.to_string(),
            kind: &property.kind,
            in_relation,
        };
        for annotation in &property.annotations {
            self.apply(scope_id, &scope, annotation, &location)?;
        }

        match &property.kind {
            PropertyKind::Aggregate(aggregate) => {
                for member in &aggregate.members {
                    self.walk(
                        member,
                        table,
                        &join(prefix, member.current_name()),
                        location.clone().nested(&member.name),
                        in_relation,
                    )?;
                }
            }
            PropertyKind::Relation(relation) if !in_relation => {
                let relation_table = relation_table_name(&self.entity.name, prefix);
                for (slot, element) in relation.elements() {
                    let PropertyKind::Aggregate(aggregate) = element else {
                        continue;
                    };
                    for member in &aggregate.members {
                        self.walk(
                            member,
                            &relation_table,
                            &join(slot, member.current_name()),
                            location.clone().nested(slot).nested(&member.name),
                            true,
                        )?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn apply(
        &mut self,
        scope_id: usize,
        scope: &Scope<'e>,
        annotation: &Annotation,
        location: &Location,
    ) -> Result<(), TranslationError> {
        let name = annotation.name();
        let target = path::resolve(self.entity, scope, &annotation.path, self.settings).map_err(
            |err| match err {
                PathError::Null => fail(
                    ErrorKind::InvalidPath,
                    location,
                    name,
                    "the path cannot be 'null'",
                ),
                PathError::Missing(path) => fail(
                    ErrorKind::InvalidPath,
                    location,
                    name,
                    format!("the path \"{path}\" does not exist"),
                ),
            },
        )?;
        let location = match annotation.path.as_str() {
            Some(path) => location.clone().nested(path),
            None => location.clone(),
        };

        match target {
            Target::Container {
                table,
                prefix,
                description,
                relation,
            } => match &annotation.check {
                Check::Custom {
                    generator,
                    args,
                    name: constraint_name,
                } if !relation => {
                    let fields: Vec<Field> = self
                        .translation
                        .table(&table)
                        .map(|t| t.fields_under(&prefix).cloned().collect())
                        .unwrap_or_default();
                    self.custom(
                        generator,
                        args,
                        constraint_name.clone(),
                        &table,
                        &fields,
                        &location,
                        name,
                    )
                }
                _ => Err(fail(
                    ErrorKind::InapplicableAnnotation,
                    &location,
                    name,
                    format!("{name} cannot be applied to a property of {description}"),
                )),
            },
            Target::Field { table, name: field } => {
                let Some(field) = self
                    .translation
                    .table(&table)
                    .and_then(|t| t.field(&field))
                    .cloned()
                else {
                    return Err(fail(
                        ErrorKind::InvalidPath,
                        &location,
                        name,
                        format!("the path \"{field}\" does not exist"),
                    ));
                };
                self.apply_to_field(scope_id, &annotation.check, &table, &field, &location)
            }
        }
    }

    fn apply_to_field(
        &mut self,
        scope_id: usize,
        check: &Check,
        table: &str,
        field: &Field,
        location: &Location,
    ) -> Result<(), TranslationError> {
        let name = check.name();
        check_applicable(check, field)
            .map_err(|problem| fail(ErrorKind::InapplicableAnnotation, location, name, problem))?;

        let invalid = invalid_value(location, name);
        let unsatisfiable =
            |problem: String| fail(ErrorKind::UnsatisfiableConstraint, location, name, problem);
        let boundary = |literal: &Value, op: ComparisonOperator| -> Result<Anchor, AnchorError> {
            let anchor = anchor::convert(literal, field, Role::Boundary, self.settings)?;
            anchor::check_sentinel(op, &anchor, &field.data_type)?;
            Ok(anchor)
        };
        let zero = || -> Result<Anchor, TranslationError> {
            let zero = field.data_type.zero().ok_or_else(|| {
                fail(
                    ErrorKind::InapplicableAnnotation,
                    location,
                    name,
                    format!("{name} cannot be applied to a Field of type {}", field.data_type),
                )
            })?;
            anchor::convert_declared(zero, field).map_err(&invalid)
        };

        let contribution = match check {
            Check::IsGreaterThan(v) => {
                Contribution::Lower(boundary(v, ComparisonOperator::Gt).map_err(&invalid)?, true)
            }
            Check::IsGreaterOrEqualTo(v) => {
                Contribution::Lower(boundary(v, ComparisonOperator::Gte).map_err(&invalid)?, false)
            }
            Check::IsLessThan(v) => {
                Contribution::Upper(boundary(v, ComparisonOperator::Lt).map_err(&invalid)?, true)
            }
            Check::IsLessOrEqualTo(v) => {
                Contribution::Upper(boundary(v, ComparisonOperator::Lte).map_err(&invalid)?, false)
            }
            Check::IsNot(v) if v.is_null() && field.nullable => Contribution::NotNull,
            Check::IsNot(v) => Contribution::Exclude(
                anchor::convert(v, field, Role::Value, self.settings)
                    .map_err(&invalid)?
                    .stored,
            ),
            Check::IsOneOf(values) | Check::IsNotOneOf(values) => {
                let mut stored = Vec::with_capacity(values.len());
                for value in values {
                    let anchor = anchor::convert(value, field, Role::Value, self.settings)
                        .map_err(&invalid)?;
                    stored.push(anchor.stored);
                }
                let stored = dedup(stored);
                if matches!(check, Check::IsOneOf(_)) {
                    if stored.is_empty() {
                        return Err(unsatisfiable("the set of allowed values is empty".into()));
                    }
                    Contribution::OneOf(stored)
                } else {
                    Contribution::NotOneOf(stored)
                }
            }
            Check::IsPositive => Contribution::Lower(zero()?, true),
            Check::IsNegative => Contribution::Upper(zero()?, true),
            Check::IsNonZero => Contribution::Exclude(zero()?.stored),
            Check::IsNonEmpty => Contribution::Length(Some(1), None),
            Check::LengthIsAtLeast(n) => {
                if *n < 1 {
                    return Err(unsatisfiable(format!("the minimum length {n} is less than 1")));
                }
                Contribution::Length(Some(*n), None)
            }
            Check::LengthIsAtMost(n) => {
                if *n < 0 {
                    return Err(unsatisfiable(format!("the maximum length {n} is less than 0")));
                }
                Contribution::Length(None, Some(*n))
            }
            Check::LengthIsBetween(min, max) => {
                if *min < 1 {
                    return Err(unsatisfiable(format!(
                        "the minimum length {min} is less than 1"
                    )));
                }
                if max < min {
                    return Err(unsatisfiable(format!(
                        "the interval [{max}, {min}] of allowed lengths is empty"
                    )));
                }
                Contribution::Length(Some(*min), Some(*max))
            }
            Check::Custom {
                generator,
                args,
                name: constraint_name,
            } => {
                return self.custom(
                    generator,
                    args,
                    constraint_name.clone(),
                    table,
                    std::slice::from_ref(field),
                    location,
                    name,
                );
            }
        };

        let key = (table.to_string(), field.name.clone());
        self.check_repeat(scope_id, check, &key, location)?;

        let bounds = self.bounds_for(key);
        let result = match contribution {
            Contribution::Lower(anchor, strict) => bounds.lower(Bound {
                value: anchor.stored,
                strict,
                source: name,
            }),
            Contribution::Upper(anchor, strict) => bounds.upper(Bound {
                value: anchor.stored,
                strict,
                source: name,
            }),
            Contribution::Exclude(value) => {
                bounds.exclude(value, name);
                Ok(())
            }
            Contribution::NotNull => {
                bounds.not_null(name);
                Ok(())
            }
            Contribution::OneOf(values) => bounds.one_of(values, name),
            Contribution::NotOneOf(values) => {
                if !values.is_empty() {
                    bounds.not_one_of(values, name);
                }
                Ok(())
            }
            Contribution::Length(min, max) => {
                if let Some(n) = min {
                    bounds.min_length(n, name).map_err(&unsatisfiable)?;
                }
                if let Some(n) = max {
                    bounds.max_length(n, name).map_err(&unsatisfiable)?;
                }
                Ok(())
            }
        };
        result.map_err(unsatisfiable)
    }

    fn check_repeat(
        &mut self,
        scope_id: usize,
        check: &Check,
        key: &FieldKey,
        location: &Location,
    ) -> Result<(), TranslationError> {
        let name = check.name();
        let applied = self.applied.entry((scope_id, key.clone())).or_default();
        if check.repeat_policy() == RepeatPolicy::Reject && applied.contains(&name) {
            return Err(fail(
                ErrorKind::InapplicableAnnotation,
                location,
                name,
                format!("multiple {name} annotations on a single Field are not supported"),
            ));
        }
        if let Some(other) = applied.iter().find(|other| check.excludes_kind(other)) {
            return Err(TranslationError::new(
                ErrorKind::InapplicableAnnotation,
                location.clone(),
                format!("{other} and {name} are mutually exclusive"),
            )
            .annotation(*other)
            .annotation(name));
        }
        if !applied.contains(&name) {
            applied.push(name);
        }
        Ok(())
    }

    fn bounds_for(&mut self, key: FieldKey) -> &mut FieldBounds {
        let index = match self.bounds_index.get(&key) {
            Some(index) => *index,
            None => {
                let index = self.bounds.len();
                self.bounds_index.insert(key.clone(), index);
                self.bounds.push((key, FieldBounds::default()));
                index
            }
        };
        &mut self.bounds[index].1
    }

    #[allow(clippy::too_many_arguments)]
    fn custom(
        &mut self,
        generator: &str,
        args: &[Value],
        constraint_name: Option<String>,
        table: &str,
        fields: &[Field],
        location: &Location,
        annotation: &str,
    ) -> Result<(), TranslationError> {
        let invalid = |problem: String| {
            fail(ErrorKind::InvalidCustomConstraint, location, annotation, problem)
        };
        let instance = self
            .registry
            .construct(generator, args)
            .map_err(|err| match err {
                ConstructError::Unknown => invalid(format!(
                    "`{generator}` is not a registered check generator"
                )),
                ConstructError::NoMatch => invalid(format!(
                    "`{generator}` cannot be constructed from arguments {}",
                    render_args(args)
                )),
                ConstructError::Failed(inner) => invalid(format!(
                    "error constructing `{generator}` from arguments {} ({inner})",
                    render_args(args)
                ))
                .source(inner),
            })?;

        let fields: Vec<&Field> = fields.iter().collect();
        let clause = instance.generate(&fields, self.settings).map_err(|inner| {
            fail(
                ErrorKind::FailedOperation,
                location,
                annotation,
                format!("unable to generate custom CHECK constraint ({inner})"),
            )
            .source(inner)
        })?;

        tracing::debug!(table, generator, clause = %clause, "generated custom constraint");
        self.customs
            .push((table.to_string(), CheckConstraint::new(clause).named(constraint_name)));
        Ok(())
    }

    fn complex_checks(&mut self) -> Result<(), TranslationError> {
        let entity = self.entity;
        let location = Location::entity(&entity.name);
        for check in &entity.checks {
            if check.fields.is_empty() {
                return Err(fail(
                    ErrorKind::InvalidCustomConstraint,
                    &location,
                    COMPLEX_CHECK,
                    "expected at least 1 Field, but found 0",
                ));
            }
            let mut fields = Vec::with_capacity(check.fields.len());
            for name in &check.fields {
                let field = self.translation.principal.field(name).cloned().ok_or_else(|| {
                    fail(
                        ErrorKind::UnrecognizedField,
                        &location,
                        COMPLEX_CHECK,
                        format!("no Field named \"{name}\" exists on the Table"),
                    )
                })?;
                fields.push(field);
            }
            self.custom(
                &check.generator,
                &check.args,
                check.name.clone(),
                &entity.name,
                &fields,
                &location,
                COMPLEX_CHECK,
            )?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Translation, TranslationError> {
        for field in self.translation.tables().flat_map(|t| &t.fields) {
            check_default_type(field)?;
        }

        for ((table, field), bounds) in std::mem::take(&mut self.bounds) {
            let emitted = bounds.finish(&field);
            let Some(target) = self.translation.table_mut(&table) else {
                continue;
            };
            if let Some(field) = target.field(&field) {
                validate_default(field, &emitted)?;
            }
            for Emitted { check, .. } in emitted {
                tracing::debug!(table = %target.name, constraint = %check, "emitted constraint");
                target.checks.push(check);
            }
        }

        for (table, check) in std::mem::take(&mut self.customs) {
            if let Some(target) = self.translation.table_mut(&table) {
                target.checks.push(check);
            }
        }
        Ok(self.translation)
    }
}

/// Check that a Field's default is a value of its declared type.
fn check_default_type(field: &Field) -> Result<(), TranslationError> {
    let Some(default) = &field.default else {
        return Ok(());
    };
    let invalidated = |problem: String| {
        TranslationError::new(ErrorKind::InvalidatedDefault, field.origin.clone(), problem)
    };
    if default.is_null() {
        if field.nullable {
            return Ok(());
        }
        return Err(invalidated(
            "the Field's default value of null is not allowed on a non-nullable Field".into(),
        ));
    }
    if !default.is_of_type(&field.data_type) {
        return Err(invalidated(format!(
            "the Field's default value of {default} is of type {}, not {} as expected",
            default.type_name(),
            field.data_type
        )));
    }
    match (default, &field.data_type) {
        (Value::Enum(enumerator), DataType::Enumeration(enumeration))
            if !enumeration.contains(&enumerator.name) =>
        {
            Err(invalidated(format!(
                "the Field's default value of {default} is not a defined enumerator"
            ))
            .details(format!(
                "{} defines {}",
                enumeration.name,
                enumeration.enumerators.join(", ")
            )))
        }
        _ => Ok(()),
    }
}

/// Check a Field's declared default against its built-in constraints.
fn validate_default(field: &Field, emitted: &[Emitted]) -> Result<(), TranslationError> {
    let Some(default) = &field.default else {
        return Ok(());
    };
    let stored = field.to_stored(default).map_err(|err| {
        TranslationError::new(
            ErrorKind::InvalidatedDefault,
            field.origin.clone(),
            format!(
                "the Field's default value of {default} cannot be converted to {}",
                field.stored_type
            ),
        )
        .details(err.message)
    })?;

    for Emitted { check, sources } in emitted {
        if check.clause.admits(&field.name, &stored) {
            continue;
        }
        let mut error = TranslationError::new(
            ErrorKind::InvalidatedDefault,
            field.origin.clone(),
            format!("the Field's default value of {default} does not pass the constraint"),
        )
        .details(check.clause.to_string());
        for source in sources {
            if !error.annotations.iter().any(|a| a == source) {
                error = error.annotation(*source);
            }
        }
        return Err(error);
    }
    Ok(())
}
