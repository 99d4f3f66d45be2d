//! Per-Field accumulation of built-in constraints.
//!
//! Every annotation that reaches a Field tightens that Field's accumulator;
//! the accumulator is turned into CHECK constraints once, after the whole
//! entity has been walked.

use std::cmp::Ordering;

use tabula_core::Value;

use crate::clause::{CheckConstraint, ComparisonOperator, Operand};

/// One side of a value interval.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bound {
    pub value: Value,
    pub strict: bool,
    /// Annotation that set this bound
    pub source: &'static str,
}

/// A CHECK constraint together with the annotation(s) it came from.
#[derive(Debug, Clone)]
pub(crate) struct Emitted {
    pub check: CheckConstraint,
    pub sources: Vec<&'static str>,
}

impl Emitted {
    fn new(check: CheckConstraint, sources: Vec<&'static str>) -> Self {
        Self { check, sources }
    }
}

/// Accumulated built-in constraints of one Field.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldBounds {
    lower: Option<Bound>,
    upper: Option<Bound>,
    excluded: Vec<(Value, &'static str)>,
    not_null: Option<&'static str>,
    one_of: Option<(Vec<Value>, &'static str)>,
    not_one_of: Option<(Vec<Value>, &'static str)>,
    min_length: Option<(i64, &'static str)>,
    max_length: Option<(i64, &'static str)>,
}

/// Whether `candidate` is a tighter lower bound than `current`.
fn tighter_lower(candidate: &Bound, current: &Bound) -> bool {
    match candidate.value.partial_cmp(&current.value) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => candidate.strict && !current.strict,
        _ => false,
    }
}

/// Whether `candidate` is a tighter upper bound than `current`.
fn tighter_upper(candidate: &Bound, current: &Bound) -> bool {
    match candidate.value.partial_cmp(&current.value) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => candidate.strict && !current.strict,
        _ => false,
    }
}

/// Remove duplicates, keeping first occurrences in order.
pub(crate) fn dedup(values: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

impl FieldBounds {
    /// Tighten the lower bound.
    pub fn lower(&mut self, bound: Bound) -> Result<(), String> {
        match &self.lower {
            Some(current) if !tighter_lower(&bound, current) => {}
            _ => self.lower = Some(bound),
        }
        self.check_interval()
    }

    /// Tighten the upper bound.
    pub fn upper(&mut self, bound: Bound) -> Result<(), String> {
        match &self.upper {
            Some(current) if !tighter_upper(&bound, current) => {}
            _ => self.upper = Some(bound),
        }
        self.check_interval()
    }

    fn check_interval(&self) -> Result<(), String> {
        let (Some(lower), Some(upper)) = (&self.lower, &self.upper) else {
            return Ok(());
        };
        let empty = match lower.value.partial_cmp(&upper.value) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => lower.strict || upper.strict,
            _ => false,
        };
        if empty {
            return Err(format!(
                "the interval {}{}, {}{} is empty",
                if lower.strict { "(" } else { "[" },
                lower.value,
                upper.value,
                if upper.strict { ")" } else { "]" },
            ));
        }
        Ok(())
    }

    /// Exclude a single value.
    pub fn exclude(&mut self, value: Value, source: &'static str) {
        if !self.excluded.iter().any(|(v, _)| *v == value) {
            self.excluded.push((value, source));
        }
    }

    /// Exclude `NULL`.
    pub fn not_null(&mut self, source: &'static str) {
        self.not_null.get_or_insert(source);
    }

    /// Restrict to a set of values; several sets intersect.
    pub fn one_of(&mut self, values: Vec<Value>, source: &'static str) -> Result<(), String> {
        let values = dedup(values);
        let merged = match self.one_of.take() {
            Some((current, _)) => current
                .into_iter()
                .filter(|v| values.contains(v))
                .collect(),
            None => values,
        };
        if merged.is_empty() {
            return Err("the intersection of the allowed values is empty".to_string());
        }
        self.one_of = Some((merged, source));
        Ok(())
    }

    /// Exclude a set of values; several sets union.
    pub fn not_one_of(&mut self, values: Vec<Value>, source: &'static str) {
        let mut merged = self.not_one_of.take().map(|(v, _)| v).unwrap_or_default();
        merged.extend(values);
        self.not_one_of = Some((dedup(merged), source));
    }

    /// Tighten the minimum length.
    pub fn min_length(&mut self, n: i64, source: &'static str) -> Result<(), String> {
        if self.min_length.is_none_or(|(current, _)| n > current) {
            self.min_length = Some((n, source));
        }
        self.check_lengths()
    }

    /// Tighten the maximum length.
    pub fn max_length(&mut self, n: i64, source: &'static str) -> Result<(), String> {
        if self.max_length.is_none_or(|(current, _)| n < current) {
            self.max_length = Some((n, source));
        }
        self.check_lengths()
    }

    fn check_lengths(&self) -> Result<(), String> {
        match (self.min_length, self.max_length) {
            (Some((min, _)), Some((max, _))) if min > max => Err(format!(
                "the combined length interval [{min}, {max}] is empty"
            )),
            _ => Ok(()),
        }
    }

    /// Turn the accumulated bounds into CHECK constraints.
    pub fn finish(self, field: &str) -> Vec<Emitted> {
        let mut emitted = Vec::new();
        let column = || Operand::field(field);

        match (self.lower, self.upper) {
            (Some(lower), Some(upper))
                if !lower.strict && !upper.strict && lower.value == upper.value =>
            {
                emitted.push(Emitted::new(
                    CheckConstraint::new(column().eq(lower.value)),
                    vec![lower.source, upper.source],
                ));
            }
            (lower, upper) => {
                if let Some(lower) = lower {
                    let op = if lower.strict {
                        ComparisonOperator::Gt
                    } else {
                        ComparisonOperator::Gte
                    };
                    emitted.push(Emitted::new(
                        CheckConstraint::new(column().compare(op, lower.value)),
                        vec![lower.source],
                    ));
                }
                if let Some(upper) = upper {
                    let op = if upper.strict {
                        ComparisonOperator::Lt
                    } else {
                        ComparisonOperator::Lte
                    };
                    emitted.push(Emitted::new(
                        CheckConstraint::new(column().compare(op, upper.value)),
                        vec![upper.source],
                    ));
                }
            }
        }

        for (value, source) in self.excluded {
            emitted.push(Emitted::new(
                CheckConstraint::new(column().ne(value)),
                vec![source],
            ));
        }
        if let Some(source) = self.not_null {
            emitted.push(Emitted::new(
                CheckConstraint::new(column().is_not_null()),
                vec![source],
            ));
        }
        if let Some((values, source)) = self.one_of {
            emitted.push(Emitted::new(
                CheckConstraint::new(column().in_list(values)),
                vec![source],
            ));
        }
        if let Some((values, source)) = self.not_one_of {
            emitted.push(Emitted::new(
                CheckConstraint::new(column().not_in_list(values)),
                vec![source],
            ));
        }

        let length = || Operand::length(field);
        match (self.min_length, self.max_length) {
            (Some((min, a)), Some((max, b))) if min == max => {
                emitted.push(Emitted::new(
                    CheckConstraint::new(length().eq(Value::I64(min))),
                    vec![a, b],
                ));
            }
            (min, max) => {
                if let Some((min, source)) = min {
                    emitted.push(Emitted::new(
                        CheckConstraint::new(length().ge(Value::I64(min))),
                        vec![source],
                    ));
                }
                if let Some((max, source)) = max {
                    emitted.push(Emitted::new(
                        CheckConstraint::new(length().le(Value::I64(max))),
                        vec![source],
                    ));
                }
            }
        }

        emitted
    }
}
