//! CHECK constraint clauses.
//!
//! Clauses are built the same way for built-in annotations and for custom
//! generators:
//!
//! ```
//! use tabula_core::Value;
//! use tabula_schema::clause::{Clause, Operand};
//!
//! let clause = Clause::and([
//!     Operand::field("Range").gt(Value::U16(0)),
//!     Operand::length("Name").ge(Value::I64(1)),
//! ]);
//! assert_eq!(clause.to_string(), r#"("Range" > 0) AND (LENGTH("Name") >= 1)"#);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use tabula_core::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl ComparisonOperator {
    /// Get the SQL representation of this operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "<>",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lte => "<=",
        }
    }

    /// Check if `lhs op rhs` holds, given `lhs.cmp(rhs)`.
    pub const fn holds(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOperator::Eq => matches!(ordering, Ordering::Equal),
            ComparisonOperator::Ne => !matches!(ordering, Ordering::Equal),
            ComparisonOperator::Gt => matches!(ordering, Ordering::Greater),
            ComparisonOperator::Lt => matches!(ordering, Ordering::Less),
            ComparisonOperator::Gte => !matches!(ordering, Ordering::Less),
            ComparisonOperator::Lte => !matches!(ordering, Ordering::Greater),
        }
    }
}

/// Set-membership operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InclusionOperator {
    In,
    NotIn,
}

impl InclusionOperator {
    /// Get the SQL representation of this operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            InclusionOperator::In => "IN",
            InclusionOperator::NotIn => "NOT IN",
        }
    }
}

/// The left-hand side of a comparison: a Field or the length of a Field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    Field(String),
    Length(String),
}

impl Operand {
    /// Reference a Field by name.
    pub fn field(name: impl Into<String>) -> Self {
        Operand::Field(name.into())
    }

    /// Reference the character length of a Field.
    pub fn length(name: impl Into<String>) -> Self {
        Operand::Length(name.into())
    }

    /// Name of the referenced Field.
    pub fn field_name(&self) -> &str {
        match self {
            Operand::Field(name) | Operand::Length(name) => name,
        }
    }

    /// Compare with a literal.
    pub fn compare(self, op: ComparisonOperator, anchor: impl Into<Value>) -> Clause {
        Clause::Compare {
            operand: self,
            op,
            anchor: anchor.into(),
        }
    }

    /// Equal to (=)
    pub fn eq(self, anchor: impl Into<Value>) -> Clause {
        self.compare(ComparisonOperator::Eq, anchor)
    }

    /// Not equal to (<>)
    pub fn ne(self, anchor: impl Into<Value>) -> Clause {
        self.compare(ComparisonOperator::Ne, anchor)
    }

    /// Greater than (>)
    pub fn gt(self, anchor: impl Into<Value>) -> Clause {
        self.compare(ComparisonOperator::Gt, anchor)
    }

    /// Less than (<)
    pub fn lt(self, anchor: impl Into<Value>) -> Clause {
        self.compare(ComparisonOperator::Lt, anchor)
    }

    /// Greater than or equal to (>=)
    pub fn ge(self, anchor: impl Into<Value>) -> Clause {
        self.compare(ComparisonOperator::Gte, anchor)
    }

    /// Less than or equal to (<=)
    pub fn le(self, anchor: impl Into<Value>) -> Clause {
        self.compare(ComparisonOperator::Lte, anchor)
    }

    /// IN list
    pub fn in_list(self, values: Vec<Value>) -> Clause {
        Clause::Inclusion {
            operand: self,
            op: InclusionOperator::In,
            values,
        }
    }

    /// NOT IN list
    pub fn not_in_list(self, values: Vec<Value>) -> Clause {
        Clause::Inclusion {
            operand: self,
            op: InclusionOperator::NotIn,
            values,
        }
    }

    /// IS NOT NULL
    pub fn is_not_null(self) -> Clause {
        Clause::NotNull(self)
    }

    fn value_of(&self, value: &Value) -> Option<Value> {
        match self {
            Operand::Field(_) => Some(value.clone()),
            Operand::Length(_) => value
                .as_str()
                .map(|s| Value::I64(i64::try_from(s.chars().count()).unwrap_or(i64::MAX))),
        }
    }
}

/// A boolean predicate over the Fields of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Clause {
    /// `operand op anchor`
    Compare {
        operand: Operand,
        op: ComparisonOperator,
        anchor: Value,
    },
    /// `operand [NOT] IN (values...)`
    Inclusion {
        operand: Operand,
        op: InclusionOperator,
        values: Vec<Value>,
    },
    /// `operand IS NOT NULL`
    NotNull(Operand),
    /// `left op right`, comparing two Fields
    Fields {
        left: String,
        op: ComparisonOperator,
        right: String,
    },
    And(Vec<Clause>),
    Or(Vec<Clause>),
    Not(Box<Clause>),
}

impl Clause {
    /// Compare two Fields.
    pub fn fields(
        left: impl Into<String>,
        op: ComparisonOperator,
        right: impl Into<String>,
    ) -> Self {
        Clause::Fields {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// Conjunction of clauses.
    pub fn and(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Clause::And(clauses.into_iter().collect())
    }

    /// Disjunction of clauses.
    pub fn or(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Clause::Or(clauses.into_iter().collect())
    }

    /// Negation of a clause.
    pub fn negate(self) -> Self {
        Clause::Not(Box::new(self))
    }

    /// Check if a row whose Field `field` holds `value` can satisfy this
    /// clause.
    ///
    /// Uses SQL's three-valued logic: comparisons against `NULL`, and
    /// comparisons involving other Fields, are unknown, and only a definite
    /// `false` rejects the value.
    pub fn admits(&self, field: &str, value: &Value) -> bool {
        self.evaluate(field, value) != Some(false)
    }

    fn evaluate(&self, field: &str, value: &Value) -> Option<bool> {
        match self {
            Clause::Compare {
                operand,
                op,
                anchor,
            } => {
                if operand.field_name() != field || value.is_null() {
                    return None;
                }
                let lhs = operand.value_of(value)?;
                lhs.partial_cmp(anchor).map(|ordering| op.holds(ordering))
            }
            Clause::Inclusion {
                operand,
                op,
                values,
            } => {
                if operand.field_name() != field || value.is_null() {
                    return None;
                }
                let lhs = operand.value_of(value)?;
                let found = values.contains(&lhs);
                Some(match op {
                    InclusionOperator::In => found,
                    InclusionOperator::NotIn => !found,
                })
            }
            Clause::NotNull(operand) => {
                (operand.field_name() == field).then(|| !value.is_null())
            }
            Clause::Fields { .. } => None,
            Clause::And(clauses) => {
                let mut result = Some(true);
                for clause in clauses {
                    match clause.evaluate(field, value) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Clause::Or(clauses) => {
                let mut result = Some(false);
                for clause in clauses {
                    match clause.evaluate(field, value) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Clause::Not(clause) => clause.evaluate(field, value).map(|b| !b),
        }
    }

    /// Check if this clause mentions a Field.
    pub fn references(&self, field: &str) -> bool {
        match self {
            Clause::Compare { operand, .. }
            | Clause::Inclusion { operand, .. }
            | Clause::NotNull(operand) => operand.field_name() == field,
            Clause::Fields { left, right, .. } => left == field || right == field,
            Clause::And(clauses) | Clause::Or(clauses) => {
                clauses.iter().any(|c| c.references(field))
            }
            Clause::Not(clause) => clause.references(field),
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Char(c) => format!("'{}'", c.to_string().replace('\'', "''")),
        Value::Enum(e) => format!("'{}'", e.name.replace('\'', "''")),
        Value::Guid(_) | Value::Date(_) | Value::DateTime(_) => {
            let text = value.to_string();
            format!("'{text}'")
        }
        Value::Array(items) => {
            let items: Vec<_> = items.iter().map(sql_literal).collect();
            format!("({})", items.join(", "))
        }
        other => other.to_string(),
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(name) => write!(f, "{}", quote_ident(name)),
            Operand::Length(name) => write!(f, "LENGTH({})", quote_ident(name)),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Compare {
                operand,
                op,
                anchor,
            } => write!(f, "{operand} {} {}", op.as_sql(), sql_literal(anchor)),
            Clause::Inclusion {
                operand,
                op,
                values,
            } => {
                let values: Vec<_> = values.iter().map(sql_literal).collect();
                write!(f, "{operand} {} ({})", op.as_sql(), values.join(", "))
            }
            Clause::NotNull(operand) => write!(f, "{operand} IS NOT NULL"),
            Clause::Fields { left, op, right } => write!(
                f,
                "{} {} {}",
                quote_ident(left),
                op.as_sql(),
                quote_ident(right)
            ),
            Clause::And(clauses) | Clause::Or(clauses) => {
                let joiner = if matches!(self, Clause::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                let parts: Vec<_> = clauses.iter().map(|c| format!("({c})")).collect();
                f.write_str(&parts.join(joiner))
            }
            Clause::Not(clause) => write!(f, "NOT ({clause})"),
        }
    }
}

/// A CHECK constraint attached to a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckConstraint {
    pub name: Option<String>,
    pub clause: Clause,
}

impl CheckConstraint {
    pub fn new(clause: Clause) -> Self {
        Self { name: None, clause }
    }

    /// Name the constraint.
    pub fn named(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

impl fmt::Display for CheckConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "CONSTRAINT {} ", quote_ident(name))?;
        }
        write!(f, "CHECK ({})", self.clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_comparison() {
        let clause = Operand::field("Range").gt(Value::U16(0));
        assert_eq!(clause.to_string(), "\"Range\" > 0");
    }

    #[test]
    fn test_render_inclusion_and_names() {
        let clause = Operand::field("Name").in_list(vec!["a'b".into(), "c".into()]);
        assert_eq!(clause.to_string(), "\"Name\" IN ('a''b', 'c')");
        let check = CheckConstraint::new(Operand::length("Name").le(Value::I64(4)))
            .named(Some("CK_len".into()));
        assert_eq!(check.to_string(), "CONSTRAINT \"CK_len\" CHECK (LENGTH(\"Name\") <= 4)");
    }

    #[test]
    fn test_render_composites() {
        let clause = Clause::or([
            Clause::fields("Low", ComparisonOperator::Lt, "High"),
            Operand::field("Low").eq(Value::Null).negate(),
        ]);
        assert_eq!(
            clause.to_string(),
            "(\"Low\" < \"High\") OR (NOT (\"Low\" = NULL))"
        );
    }

    #[test]
    fn test_admits_comparisons() {
        let clause = Operand::field("X").gte_for_test(5);
        assert!(clause.admits("X", &Value::I32(5)));
        assert!(!clause.admits("X", &Value::I32(4)));
        assert!(clause.admits("X", &Value::Null));
        assert!(clause.admits("Y", &Value::I32(0)));
    }

    #[test]
    fn test_admits_length_and_inclusion() {
        let len = Operand::length("Name").ge(Value::I64(3));
        assert!(len.admits("Name", &Value::Text("héé".into())));
        assert!(!len.admits("Name", &Value::Text("ab".into())));

        let not_in = Operand::field("N").not_in_list(vec![Value::I32(1), Value::I32(2)]);
        assert!(!not_in.admits("N", &Value::I32(2)));
        assert!(not_in.admits("N", &Value::I32(3)));
    }

    #[test]
    fn test_admits_three_valued_logic() {
        let clause = Clause::and([
            Operand::field("X").gt(Value::I32(0)),
            Clause::fields("X", ComparisonOperator::Lt, "Y"),
        ]);
        assert!(clause.admits("X", &Value::I32(1)));
        assert!(!clause.admits("X", &Value::I32(-1)));

        let negated = Clause::fields("X", ComparisonOperator::Lt, "Y").negate();
        assert!(negated.admits("X", &Value::I32(1)));
    }

    #[test]
    fn test_not_null() {
        let clause = Operand::field("Family").is_not_null();
        assert_eq!(clause.to_string(), "\"Family\" IS NOT NULL");
        assert!(!clause.admits("Family", &Value::Null));
        assert!(clause.admits("Family", &Value::Text("Serif".into())));
        assert!(clause.admits("Size", &Value::Null));
        assert!(clause.references("Family"));
    }

    #[test]
    fn test_references() {
        let clause = Clause::and([
            Operand::field("A").gt(Value::I32(0)),
            Clause::fields("B", ComparisonOperator::Eq, "C"),
        ]);
        assert!(clause.references("A"));
        assert!(clause.references("C"));
        assert!(!clause.references("D"));
    }

    impl Operand {
        fn gte_for_test(self, n: i32) -> Clause {
            self.ge(Value::I32(n))
        }
    }
}
