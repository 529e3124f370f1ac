//! Field-level validation.
//!
//! Constraints live in a declarative rule table keyed by [`Field`]. Every
//! field is checked, so a caller sees all problems with a record at once.
//! Within one field only the first failing rule is reported.

mod batch;
mod rules;

pub use batch::*;
pub use rules::*;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::models::{Patient, PatientInput};

/// The validated fields of a patient record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    BirthDate,
    Gender,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::FirstName,
        Field::LastName,
        Field::BirthDate,
        Field::Gender,
    ];

    /// Human-readable label, matching the upload column headers.
    pub fn label(&self) -> &'static str {
        match self {
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::BirthDate => "Birthday",
            Field::Gender => "Gender",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single reported problem with an uploaded row or a submitted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    /// 1-based data row, for uploads
    pub row: Option<usize>,
    /// "First Last" of the offending record, when known
    pub name: Option<String>,
    /// Field at fault; `None` for row- or document-level problems
    pub field: Option<Field>,
    pub reason: String,
}

impl Violation {
    /// Violation for a single submitted record.
    pub fn field(field: Field, reason: impl Into<String>) -> Self {
        Self {
            row: None,
            name: None,
            field: Some(field),
            reason: reason.into(),
        }
    }

    /// Violation affecting a whole document.
    pub fn document(reason: impl Into<String>) -> Self {
        Self {
            row: None,
            name: None,
            field: None,
            reason: reason.into(),
        }
    }

    /// Attribute this violation to an upload row.
    pub fn at_row(mut self, row: usize, name: &str) -> Self {
        self.row = Some(row);
        let name = name.trim();
        self.name = (!name.is_empty()).then(|| name.to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(row) = self.row {
            write!(f, "Row {}", row)?;
            if let Some(name) = &self.name {
                write!(f, " ({})", name)?;
            }
            f.write_str(": ")?;
        }
        match self.field {
            Some(field) => write!(f, "{} {}", field, self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

/// Join violations into one message, in order.
pub fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a single candidate record.
///
/// Name fields are trimmed before the rules run. Returns the validated
/// record (keeping the candidate's identity) or every violation found.
pub fn validate_input(input: PatientInput, config: &ImportConfig) -> Result<Patient, Vec<Violation>> {
    let input = input.trimmed();
    let violations: Vec<Violation> = check_all(&input, config)
        .into_iter()
        .map(|(field, reason)| Violation::field(field, reason))
        .collect();

    if !violations.is_empty() {
        return Err(violations);
    }
    into_patient(input).ok_or_else(|| vec![Violation::document("Record is incomplete")])
}

/// Convert a candidate that passed every rule.
pub(crate) fn into_patient(input: PatientInput) -> Option<Patient> {
    Some(Patient {
        id: input.id,
        first_name: input.first_name,
        last_name: input.last_name,
        birth_date: input.birth_date?,
        gender: input.gender?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_input() {
        let input = PatientInput::new(" Ann ", "Lee", date(1990, 1, 1), Gender::Female);
        let patient = validate_input(input, &ImportConfig::default()).unwrap();
        assert_eq!(patient.first_name, "Ann");
        assert_eq!(patient.id, None);
    }

    #[test]
    fn test_collects_every_field() {
        let input = PatientInput {
            id: None,
            first_name: "   ".into(),
            last_name: "x".repeat(51),
            birth_date: None,
            gender: None,
        };
        let violations = validate_input(input, &ImportConfig::default()).unwrap_err();
        let fields: Vec<Field> = violations.iter().filter_map(|v| v.field).collect();
        assert_eq!(fields, Field::ALL.to_vec());
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::field(Field::FirstName, "is required").at_row(2, " Kim");
        assert_eq!(v.to_string(), "Row 2 (Kim): First Name is required");

        let v = Violation::field(Field::Gender, "is required");
        assert_eq!(v.to_string(), "Gender is required");

        let v = Violation::document("Missing required column: Gender").at_row(4, "");
        assert_eq!(v.to_string(), "Row 4: Missing required column: Gender");
    }

    #[test]
    fn test_join_violations() {
        let violations = vec![
            Violation::field(Field::FirstName, "is required"),
            Violation::field(Field::Gender, "is required"),
        ];
        assert_eq!(
            join_violations(&violations),
            "First Name is required; Gender is required"
        );
    }
}
