//! Batch validation.

use super::{check_fields, into_patient, Field, Violation};
use crate::config::ImportConfig;
use crate::import::ParsedRow;
use crate::models::Patient;

/// A batch in which every row passed parsing and every rule.
///
/// Only [`validate_batch`] constructs this type, so holding one proves the
/// batch is safe to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBatch {
    patients: Vec<Patient>,
}

impl ValidBatch {
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

/// Outcome of validating a parsed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchValidation {
    Valid(ValidBatch),
    /// Every violation of every row, ordered by row
    Invalid(Vec<Violation>),
}

impl BatchValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, BatchValidation::Valid(_))
    }
}

/// Validate every parsed row, reporting parse failures and rule violations
/// together.
///
/// A field that failed to parse is not re-checked by the rules, and a row
/// with the wrong number of columns is reported only for that.
pub fn validate_batch(rows: Vec<ParsedRow>, config: &ImportConfig) -> BatchValidation {
    let mut patients = Vec::with_capacity(rows.len());
    let mut violations = Vec::new();

    for ParsedRow { row, input, errors } in rows {
        let input = input.trimmed();
        let name = input.display_name();

        let mut row_violations: Vec<Violation> = errors
            .iter()
            .map(|error| {
                Violation {
                    row: None,
                    name: None,
                    field: error.field(),
                    reason: error.reason(),
                }
                .at_row(row, &name)
            })
            .collect();

        let malformed_row = errors.iter().any(|e| e.field().is_none());
        if !malformed_row {
            let unparsed: Vec<Field> = Field::ALL
                .into_iter()
                .filter(|field| !errors.iter().any(|e| e.field() == Some(*field)))
                .collect();
            row_violations.extend(
                check_fields(&input, config, &unparsed)
                    .into_iter()
                    .map(|(field, reason)| Violation::field(field, reason).at_row(row, &name)),
            );
        }

        if row_violations.is_empty() {
            if let Some(patient) = into_patient(input) {
                patients.push(patient);
            }
            continue;
        }

        row_violations.sort_by_key(|v| v.field.map(|f| f as usize + 1).unwrap_or(0));
        violations.extend(row_violations);
    }

    if violations.is_empty() {
        BatchValidation::Valid(ValidBatch { patients })
    } else {
        BatchValidation::Invalid(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ParseError;
    use crate::models::{Gender, PatientInput};
    use chrono::NaiveDate;

    fn row(n: usize, first: &str, last: &str) -> ParsedRow {
        ParsedRow {
            row: n,
            input: PatientInput::new(
                first,
                last,
                NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                Gender::Female,
            ),
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_empty_batch_is_valid() {
        match validate_batch(Vec::new(), &ImportConfig::default()) {
            BatchValidation::Valid(batch) => assert!(batch.is_empty()),
            other => panic!("expected valid batch, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_rows_are_trimmed() {
        let result = validate_batch(vec![row(1, " Ann ", "Lee ")], &ImportConfig::default());
        let BatchValidation::Valid(batch) = result else {
            panic!("expected valid batch");
        };
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.patients()[0].first_name, "Ann");
        assert_eq!(batch.patients()[0].last_name, "Lee");
    }

    #[test]
    fn test_reports_every_invalid_row() {
        let rows = vec![
            row(1, "", "Lee"),
            row(2, "Ann", "Lee"),
            row(3, "Bo", ""),
            row(4, &"x".repeat(60), "Kim"),
        ];
        let BatchValidation::Invalid(violations) = validate_batch(rows, &ImportConfig::default())
        else {
            panic!("expected invalid batch");
        };
        let rows: Vec<usize> = violations.iter().filter_map(|v| v.row).collect();
        assert_eq!(rows, vec![1, 3, 4]);
    }

    #[test]
    fn test_parse_failure_suppresses_rule_for_same_field() {
        let mut parsed = row(5, "", "Lee");
        parsed.input.birth_date = None;
        parsed.errors.push(ParseError::InvalidDate {
            value: "1990-13-01".into(),
        });

        let BatchValidation::Invalid(violations) =
            validate_batch(vec![parsed], &ImportConfig::default())
        else {
            panic!("expected invalid batch");
        };

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, Some(Field::FirstName));
        assert_eq!(violations[1].field, Some(Field::BirthDate));
        assert!(violations[1].reason.contains("1990-13-01"));
    }

    #[test]
    fn test_column_mismatch_reported_alone() {
        let parsed = ParsedRow {
            row: 2,
            input: PatientInput::default(),
            errors: vec![ParseError::ColumnCount {
                expected: 4,
                found: 2,
            }],
        };
        let BatchValidation::Invalid(violations) =
            validate_batch(vec![parsed], &ImportConfig::default())
        else {
            panic!("expected invalid batch");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "Row 2: expected 4 columns, found 2");
    }
}
