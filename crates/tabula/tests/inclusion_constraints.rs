use tabula::Table;
use tabula::prelude::*;

fn checks(table: &Table) -> Vec<String> {
    table.checks.iter().map(ToString::to_string).collect()
}

fn translate_err(entity: &Entity) -> TranslationError {
    match tabula::translate(entity) {
        Err(Error::Translation(err)) => err,
        other => panic!("expected a translation error, got {other:?}"),
    }
}

fn color() -> EnumType {
    EnumType::new("Color", ["Red", "Green", "Blue"])
}

#[test]
fn is_one_of_drops_duplicate_values() {
    let values = [4_u32, 8, 10, 12, 20, 20, 100].map(Value::U32).to_vec();
    let entity = Entity::new("Font")
        .property(Property::new("Size", DataType::U32).check(Check::IsOneOf(values)));

    let translation = tabula::translate(&entity).unwrap();
    assert_eq!(translation.principal.checks.len(), 1);
    assert_eq!(
        translation.principal.checks[0].clause,
        Operand::field("Size").in_list([4_u32, 8, 10, 12, 20, 100].map(Value::U32).to_vec())
    );
    assert_eq!(
        checks(&translation.principal),
        vec![r#"CHECK ("Size" IN (4, 8, 10, 12, 20, 100))"#]
    );
}

#[test]
fn null_in_a_set_is_rejected_even_for_nullable_fields() {
    let entity = Entity::new("Font").property(
        Property::new("Family", Scalar::new(DataType::Text).nullable(true))
            .check(Check::IsOneOf(vec![Value::from("Serif"), Value::Null])),
    );
    let err = translate_err(&entity);
    assert_eq!(err.kind, ErrorKind::InvalidConstraintValue);
    assert_eq!(err.problem, "the constraint value cannot be 'null'");
    assert_eq!(err.annotations, vec!["IsOneOf"]);
}

#[test]
fn excluded_values_accumulate_without_duplicates() {
    let entity = Entity::new("Font").property(
        Property::new("Kerning", DataType::I16)
            .check(Check::IsNot(Value::I16(0)))
            .check(Check::IsNot(Value::I16(7)))
            .check(Check::IsNonZero),
    );
    let translation = tabula::translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![
            r#"CHECK ("Kerning" <> 0)"#,
            r#"CHECK ("Kerning" <> 7)"#
        ]
    );
}

#[test]
fn is_not_null_on_a_nullable_field() {
    let entity = Entity::new("Font").property(
        Property::new("Family", Scalar::new(DataType::Text).nullable(true))
            .check(Check::IsNot(Value::Null))
            .check(Check::IsNot(Value::from("Comic Sans"))),
    );
    let translation = tabula::translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![
            r#"CHECK ("Family" <> 'Comic Sans')"#,
            r#"CHECK ("Family" IS NOT NULL)"#
        ]
    );
}

#[test]
fn is_not_null_on_a_non_nullable_field_is_rejected() {
    let entity = Entity::new("Font").property(
        Property::new("Family", DataType::Text).check(Check::IsNot(Value::Null)),
    );
    let err = translate_err(&entity);
    assert_eq!(err.kind, ErrorKind::InvalidConstraintValue);
    assert_eq!(err.problem, "the constraint value cannot be 'null'");
    assert_eq!(err.annotations, vec!["IsNot"]);
}

#[test]
fn is_not_one_of_applies_to_non_orderable_types() {
    let entity = Entity::new("Font").property(
        Property::new("Monospaced", DataType::Bool)
            .check(Check::IsNotOneOf(vec![Value::Bool(true)])),
    );
    let translation = tabula::translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![r#"CHECK ("Monospaced" NOT IN (TRUE))"#]
    );
}

#[test]
fn inclusion_and_exclusion_are_mutually_exclusive() {
    let entity = Entity::new("Font").property(
        Property::new("Size", DataType::U8)
            .check(Check::IsOneOf(vec![Value::U8(8), Value::U8(10)]))
            .check(Check::IsNotOneOf(vec![Value::U8(9)])),
    );
    let err = translate_err(&entity);
    assert_eq!(err.kind, ErrorKind::InapplicableAnnotation);
    assert_eq!(err.annotations, vec!["IsOneOf", "IsNotOneOf"]);
    assert_eq!(err.problem, "IsOneOf and IsNotOneOf are mutually exclusive");
}

#[test]
fn repeated_inclusion_on_one_property_is_rejected() {
    let entity = Entity::new("Font").property(
        Property::new("Size", DataType::U8)
            .check(Check::IsOneOf(vec![Value::U8(8)]))
            .check(Check::IsOneOf(vec![Value::U8(8), Value::U8(10)])),
    );
    let err = translate_err(&entity);
    assert!(err.problem.starts_with("multiple IsOneOf annotations"));
}

#[test]
fn inclusion_sets_from_different_properties_intersect() {
    let entity = Entity::new("Font").property(
        Property::new(
            "Style",
            Aggregate::new("Style").member(
                Property::new("Weight", DataType::U16).check(Check::IsOneOf(
                    [100_u16, 400, 700].map(Value::U16).to_vec(),
                )),
            ),
        )
        .check_at(
            "Weight",
            Check::IsOneOf([400_u16, 700, 900].map(Value::U16).to_vec()),
        ),
    );
    let translation = tabula::translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![r#"CHECK ("Style.Weight" IN (400, 700))"#]
    );
}

#[test]
fn disjoint_inclusion_sets_are_unsatisfiable() {
    let entity = Entity::new("Font").property(
        Property::new(
            "Style",
            Aggregate::new("Style").member(
                Property::new("Weight", DataType::U16).check(Check::IsOneOf(vec![Value::U16(100)])),
            ),
        )
        .check_at("Weight", Check::IsOneOf(vec![Value::U16(900)])),
    );
    let err = translate_err(&entity);
    assert_eq!(err.kind, ErrorKind::UnsatisfiableConstraint);
    assert_eq!(err.location.to_string(), "`Font` → Style → Weight");
}

#[test]
fn empty_inclusion_set_is_unsatisfiable() {
    let entity = Entity::new("Font")
        .property(Property::new("Size", DataType::U8).check(Check::IsOneOf(Vec::new())));
    let err = translate_err(&entity);
    assert_eq!(err.kind, ErrorKind::UnsatisfiableConstraint);
    assert_eq!(err.problem, "the set of allowed values is empty");
}

#[test]
fn enumeration_anchors_go_through_the_converter() {
    let converter = DataConverter::enum_to_string(color());
    let entity = Entity::new("Swatch").property(
        Property::new(
            "Color",
            Scalar::new(DataType::Enumeration(color())).converter(converter.clone()),
        )
        .check(Check::IsOneOf(vec![
            Value::enumerator("Color", "Red"),
            Value::enumerator("Color", "Green"),
        ])),
    );
    let translation = tabula::translate(&entity).unwrap();
    assert_eq!(
        checks(&translation.principal),
        vec![r#"CHECK ("Color" IN ('Red', 'Green'))"#]
    );

    let field = translation.principal.field("Color").unwrap();
    assert_eq!(field.stored_type, DataType::Text);

    let tabula::Clause::Inclusion { values, .. } = &translation.principal.checks[0].clause else {
        panic!("expected an inclusion clause");
    };
    let reverted: Vec<Value> = values.iter().map(|v| converter.revert(v).unwrap()).collect();
    assert_eq!(
        reverted,
        vec![
            Value::enumerator("Color", "Red"),
            Value::enumerator("Color", "Green")
        ]
    );
}

#[test]
fn enumeration_stored_as_position() {
    let converter = DataConverter::enum_to_numeric(color(), DataType::I32).unwrap();
    let entity = Entity::new("Swatch").property(
        Property::new("Shade", Scalar::new(DataType::Enumeration(color())).converter(converter))
            .check(Check::IsNot(Value::enumerator("Color", "Blue"))),
    );
    let translation = tabula::translate(&entity).unwrap();
    assert_eq!(checks(&translation.principal), vec![r#"CHECK ("Shade" <> 2)"#]);
}

#[test]
fn converted_fields_expect_anchors_in_the_source_type() {
    let entity = Entity::new("Swatch").property(
        Property::new(
            "Color",
            Scalar::new(DataType::Enumeration(color()))
                .converter(DataConverter::enum_to_string(color())),
        )
        .check(Check::IsNot(Value::from("Red"))),
    );
    let err = translate_err(&entity);
    assert_eq!(err.kind, ErrorKind::InvalidConstraintValue);
    assert_eq!(err.problem, "value \"Red\" is of type String, not Color as expected");
}

#[test]
fn undefined_enumerators_are_rejected() {
    let entity = Entity::new("Swatch").property(
        Property::new("Color", DataType::Enumeration(color()))
            .check(Check::IsNot(Value::enumerator("Color", "Purple"))),
    );
    let err = translate_err(&entity);
    assert_eq!(err.kind, ErrorKind::InvalidConstraintValue);
    assert!(err.problem.contains("Color::Purple"));
    assert!(err.problem.contains("not defined"));
}
