//! Type gates: which constraint kinds fit which Field types.

use tabula_core::{Check, DataType};

use crate::table::Field;

/// Check that `check` may constrain `field`.
///
/// Returns the problem statement when it may not. Comparisons and the sign
/// family look at the declared type; the length family looks at the stored
/// type, since lengths are measured on what is persisted.
pub(crate) fn check_applicable(check: &Check, field: &Field) -> Result<(), String> {
    let declared = &field.data_type;
    let reject = |adjective: &str, ty: &DataType| {
        Err(format!(
            "{} cannot be applied to a Field of {adjective} type {ty}",
            check.name()
        ))
    };

    match check {
        Check::IsGreaterThan(_)
        | Check::IsLessThan(_)
        | Check::IsGreaterOrEqualTo(_)
        | Check::IsLessOrEqualTo(_) => {
            if !declared.is_orderable() {
                return reject("non-orderable", declared);
            }
        }
        Check::IsPositive | Check::IsNonZero => {
            if !declared.is_numeric() {
                return reject("non-numeric", declared);
            }
        }
        Check::IsNegative => {
            if !declared.is_numeric() {
                return reject("non-numeric", declared);
            }
            if !declared.is_signed() {
                return reject("unsigned", declared);
            }
        }
        Check::IsNonEmpty
        | Check::LengthIsAtLeast(_)
        | Check::LengthIsAtMost(_)
        | Check::LengthIsBetween(_, _) => {
            if !field.stored_type.is_textual() {
                return reject("non-textual", &field.stored_type);
            }
        }
        Check::IsNot(_) | Check::IsOneOf(_) | Check::IsNotOneOf(_) | Check::Custom { .. } => {}
    }
    Ok(())
}
