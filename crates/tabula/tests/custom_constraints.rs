use tabula::prelude::*;
use tabula::{BoxError, ComparisonOperator, Table};

fn checks(table: &Table) -> Vec<String> {
    table.checks.iter().map(ToString::to_string).collect()
}

/// Requires each Field to be strictly less than the next.
struct Ordered;

impl CheckGenerator for Ordered {
    fn generate(
        &self,
        fields: &[&Field],
        _settings: &Settings,
    ) -> std::result::Result<Clause, BoxError> {
        if fields.len() < 2 {
            return Err(format!("at least two Fields are required, found {}", fields.len()).into());
        }
        let pairs: Vec<Clause> = fields
            .windows(2)
            .map(|w| Clause::fields(&w[0].name, ComparisonOperator::Lt, &w[1].name))
            .collect();
        Ok(match <[Clause; 1]>::try_from(pairs) {
            Ok([single]) => single,
            Err(pairs) => Clause::and(pairs),
        })
    }
}

/// Requires a Field to be at least some value.
struct AtLeast(Value);

impl CheckGenerator for AtLeast {
    fn generate(
        &self,
        fields: &[&Field],
        _settings: &Settings,
    ) -> std::result::Result<Clause, BoxError> {
        Ok(Operand::field(&fields[0].name).ge(self.0.clone()))
    }
}

fn registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    registry.register("Ordered", vec![], |_| Ok(Ordered)).unwrap();
    registry
        .register("AtLeast", vec![Param::new(DataType::I32)], |args| {
            Ok(AtLeast(args[0].clone()))
        })
        .unwrap();
    registry
        .register(
            "Between",
            vec![Param::new(DataType::I32), Param::new(DataType::I32)],
            |args| -> std::result::Result<AtLeast, BoxError> {
                if args[0] > args[1] {
                    return Err("lower bound exceeds upper bound".into());
                }
                Ok(AtLeast(args[0].clone()))
            },
        )
        .unwrap();
    registry
}

fn translate(entity: &Entity) -> std::result::Result<Translation, TranslationError> {
    Translator::new(&registry()).translate(entity)
}

fn size(check: Check) -> Entity {
    Entity::new("Font").property(Property::new("Size", DataType::I32).check(check))
}

#[test]
fn custom_constraints_follow_built_in_ones() {
    let entity = Entity::new("Font").property(
        Property::new("Size", DataType::I32)
            .check(Check::Custom {
                generator: "AtLeast".into(),
                args: vec![Value::I32(6)],
                name: Some("size_floor".into()),
            })
            .check(Check::IsLessThan(Value::I32(100))),
    );
    let translation = translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![
            r#"CHECK ("Size" < 100)"#,
            r#"CONSTRAINT "size_floor" CHECK ("Size" >= 6)"#
        ]
    );
}

#[test]
fn unknown_generator_is_rejected() {
    let err = translate(&size(Check::custom("Missing", []))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCustomConstraint);
    assert_eq!(err.annotations, vec!["Check"]);
    assert_eq!(err.problem, "`Missing` is not a registered check generator");
}

#[test]
fn arguments_must_match_a_factory() {
    let err = translate(&size(Check::custom("AtLeast", [Value::from("six")]))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCustomConstraint);
    assert_eq!(
        err.problem,
        "`AtLeast` cannot be constructed from arguments {\"six\"}"
    );
}

#[test]
fn factory_errors_are_wrapped() {
    let err = translate(&size(Check::custom(
        "Between",
        [Value::I32(9), Value::I32(3)],
    )))
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCustomConstraint);
    assert_eq!(
        err.problem,
        "error constructing `Between` from arguments {9, 3} (lower bound exceeds upper bound)"
    );
    assert_eq!(
        err.source.as_ref().map(ToString::to_string).as_deref(),
        Some("lower bound exceeds upper bound")
    );
}

#[test]
fn generation_errors_are_failed_operations() {
    let err = translate(&size(Check::custom("Ordered", []))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::FailedOperation);
    assert_eq!(
        err.problem,
        "unable to generate custom CHECK constraint (at least two Fields are required, found 1)"
    );
    assert!(err.source.is_some());
}

#[test]
fn custom_on_an_aggregate_receives_all_its_fields() {
    let entity = Entity::new("Font").property(
        Property::new(
            "Range",
            Aggregate::new("Range")
                .member(Property::new("Low", DataType::U32))
                .member(Property::new("High", DataType::U32).renamed("Top")),
        )
        .check(Check::custom("Ordered", [])),
    );
    let translation = translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![r#"CHECK ("Range.Low" < "Range.Top")"#]
    );
}

#[test]
fn custom_on_a_relation_is_inapplicable() {
    let entity = Entity::new("Font").property(
        Property::new("Aliases", Relation::list(DataType::Text))
            .check(Check::custom("Ordered", [])),
    );
    let err = translate(&entity).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InapplicableAnnotation);
    assert_eq!(
        err.problem,
        "Check cannot be applied to a property of relation type"
    );
}

#[test]
fn complex_checks_use_current_field_names() {
    let entity = Entity::new("Font")
        .property(Property::new("MinSize", DataType::U8).renamed("Smallest"))
        .property(Property::new("MaxSize", DataType::U8).renamed("Largest"))
        .check(
            ComplexCheck::new("Ordered")
                .field("Smallest")
                .field("Largest")
                .named("sizes_ordered"),
        );
    let translation = translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![r#"CONSTRAINT "sizes_ordered" CHECK ("Smallest" < "Largest")"#]
    );

    let entity = Entity::new("Font")
        .property(Property::new("MinSize", DataType::U8).renamed("Smallest"))
        .property(Property::new("MaxSize", DataType::U8).renamed("Largest"))
        .check(ComplexCheck::new("Ordered").field("MinSize").field("Largest"));
    let err = translate(&entity).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnrecognizedField);
    assert_eq!(err.annotations, vec!["ComplexCheck"]);
    assert_eq!(err.location.to_string(), "`Font`");
    assert_eq!(err.problem, "no Field named \"MinSize\" exists on the Table");
}

#[test]
fn complex_checks_need_a_field() {
    let entity = Entity::new("Font")
        .property(Property::new("Size", DataType::I32))
        .check(ComplexCheck::new("AtLeast").arg(Value::I32(1)));
    let err = translate(&entity).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCustomConstraint);
    assert_eq!(err.problem, "expected at least 1 Field, but found 0");
}

#[test]
fn complex_checks_keep_duplicate_fields() {
    let entity = Entity::new("Font")
        .property(Property::new("Low", DataType::I32))
        .property(Property::new("High", DataType::I32))
        .check(
            ComplexCheck::new("Ordered")
                .field("Low")
                .field("High")
                .field("Low"),
        );
    let translation = translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![r#"CHECK (("Low" < "High") AND ("High" < "Low"))"#]
    );
}

#[test]
fn registry_rejects_invalid_identifiers() {
    let mut registry = GeneratorRegistry::new();
    let err = registry
        .register("not valid", vec![], |_| Ok(Ordered))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Configuration error: `not valid` is not a valid generator identifier"
    );
}
