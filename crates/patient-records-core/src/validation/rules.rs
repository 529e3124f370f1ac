//! Constraint table.

use super::Field;
use crate::config::ImportConfig;
use crate::models::PatientInput;

/// A constraint check: `Some(reason)` when violated.
pub type Check = fn(&PatientInput, &ImportConfig) -> Option<String>;

/// One constraint bound to the field it reports against.
pub struct FieldRule {
    pub field: Field,
    pub check: Check,
}

/// Every constraint on a patient record, in reporting order.
///
/// A field with several rules reports only its first failing rule.
pub const RULES: &[FieldRule] = &[
    FieldRule { field: Field::FirstName, check: first_name_required },
    FieldRule { field: Field::FirstName, check: first_name_max_len },
    FieldRule { field: Field::LastName, check: last_name_required },
    FieldRule { field: Field::LastName, check: last_name_max_len },
    FieldRule { field: Field::BirthDate, check: birth_date_required },
    FieldRule { field: Field::Gender, check: gender_required },
];

/// Evaluate the rules of one field.
pub fn check_field(field: Field, input: &PatientInput, config: &ImportConfig) -> Option<String> {
    RULES
        .iter()
        .filter(|rule| rule.field == field)
        .find_map(|rule| (rule.check)(input, config))
}

/// Evaluate every field, returning one `(field, reason)` per failed field.
pub fn check_all(input: &PatientInput, config: &ImportConfig) -> Vec<(Field, String)> {
    check_fields(input, config, &Field::ALL)
}

/// Evaluate the given fields only.
pub fn check_fields(
    input: &PatientInput,
    config: &ImportConfig,
    fields: &[Field],
) -> Vec<(Field, String)> {
    fields
        .iter()
        .filter_map(|&field| check_field(field, input, config).map(|reason| (field, reason)))
        .collect()
}

fn required_text(value: &str) -> Option<String> {
    value.trim().is_empty().then(|| "is required".to_string())
}

fn max_len(value: &str, max: usize) -> Option<String> {
    let len = value.trim().chars().count();
    (len > max).then(|| format!("must be at most {} characters (got {})", max, len))
}

fn first_name_required(input: &PatientInput, _: &ImportConfig) -> Option<String> {
    required_text(&input.first_name)
}

fn first_name_max_len(input: &PatientInput, config: &ImportConfig) -> Option<String> {
    max_len(&input.first_name, config.max_name_len())
}

fn last_name_required(input: &PatientInput, _: &ImportConfig) -> Option<String> {
    required_text(&input.last_name)
}

fn last_name_max_len(input: &PatientInput, config: &ImportConfig) -> Option<String> {
    max_len(&input.last_name, config.max_name_len())
}

// Calendar validity is enforced by `NaiveDate` at parse time.
fn birth_date_required(input: &PatientInput, _: &ImportConfig) -> Option<String> {
    input.birth_date.is_none().then(|| "is required".to_string())
}

fn gender_required(input: &PatientInput, _: &ImportConfig) -> Option<String> {
    input.gender.is_none().then(|| "is required".to_string())
}
