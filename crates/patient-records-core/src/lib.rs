//! Patient Records Core Library
//!
//! Bulk ingestion, validation, persistence and search of patient records.
//!
//! # Architecture
//!
//! ```text
//! Upload bytes → CSV reader → Batch parser ─┐
//!                                           ▼
//!                                       Validator ──── violations ──→ caller
//!                                           │
//!                                     [ValidBatch]
//!                                           │
//!                                     Bulk writer
//!                                           │
//!                          ┌────────────────▼────────────────┐
//!                          │   Store (one transaction)       │
//!                          │   all rows visible, or none     │
//!                          └────────────────┬────────────────┘
//!                                           │
//!                              read_all → Query engine → filtered, sorted listing
//! ```
//!
//! # Core Principle
//!
//! **An upload is all or nothing.** Every row is validated and every problem is
//! reported before anything is written.
//!
//! # Modules
//!
//! - [`db`]: SQLite store behind the [`db::PatientStore`] trait
//! - [`models`]: Domain types (Patient, PatientInput, SearchCriteria)
//! - [`import`]: CSV reader, batch parser and bulk writer
//! - [`validation`]: Rule table and batch validation
//! - [`query`]: Filtering and stable sorting
//! - [`service`]: Create, update, upload and search operations
//! - [`config`]: Runtime configuration

pub mod config;
pub mod db;
pub mod import;
pub mod models;
pub mod query;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::{ImportConfig, RecordsConfig};
pub use db::{Database, PatientStore};
pub use models::{Gender, Patient, PatientInput, SearchCriteria, SortDirection, SortField, SortSpec};
pub use service::{RecordError, RecordService};
pub use validation::Violation;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use models::DATE_FORMAT;
use validation::Field;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PatientRecordsError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation errors occurred: {}", .violations.join("; "))]
    ValidationError { violations: Vec<String> },
}

impl From<db::DbError> for PatientRecordsError {
    fn from(e: db::DbError) -> Self {
        PatientRecordsError::DatabaseError(e.to_string())
    }
}

impl From<RecordError> for PatientRecordsError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Invalid(violations) => PatientRecordsError::ValidationError {
                violations: violations.iter().map(|v| v.to_string()).collect(),
            },
            RecordError::IdentityMismatch { .. } | RecordError::UnsupportedSortField(_) => {
                PatientRecordsError::InvalidInput(e.to_string())
            }
            RecordError::NotFound(id) => PatientRecordsError::NotFound(format!("patient {}", id)),
            RecordError::Store(e) => e.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for PatientRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PatientRecordsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(PatientRecordsCore::new(db, ImportConfig::default())))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PatientRecordsCore::new(db, ImportConfig::default())))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PatientRecordsCore {
    db: Arc<Mutex<Database>>,
    config: ImportConfig,
}

impl PatientRecordsCore {
    pub fn new(db: Database, config: ImportConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }
    }
}

#[uniffi::export]
impl PatientRecordsCore {
    /// Validate and store a new patient.
    pub fn create_patient(&self, patient: FfiPatient) -> Result<FfiPatient, PatientRecordsError> {
        let input: PatientInput = patient.try_into()?;
        let db = self.db.lock()?;
        let service = RecordService::with_config(&*db, self.config.clone());
        Ok(service.create(input)?.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, PatientRecordsError> {
        let db = self.db.lock()?;
        let service = RecordService::with_config(&*db, self.config.clone());
        Ok(service.get(id)?.map(|p| p.into()))
    }

    /// Replace an existing patient. `patient.id` must equal `id`.
    pub fn update_patient(
        &self,
        id: i64,
        patient: FfiPatient,
    ) -> Result<FfiPatient, PatientRecordsError> {
        let input: PatientInput = patient.try_into()?;
        let db = self.db.lock()?;
        let service = RecordService::with_config(&*db, self.config.clone());
        Ok(service.update(id, input)?.into())
    }

    /// Import a CSV upload. Returns the number of patients stored.
    pub fn upload_csv(&self, data: Vec<u8>) -> Result<u32, PatientRecordsError> {
        let db = self.db.lock()?;
        let service = RecordService::with_config(&*db, self.config.clone());
        Ok(service.upload(&data)? as u32)
    }

    /// Search patients by name, optionally ordered by `FirstName` or `LastName`.
    pub fn search_patients(
        &self,
        filter: Option<String>,
        order_by: Option<String>,
        descending: bool,
    ) -> Result<Vec<FfiPatient>, PatientRecordsError> {
        let db = self.db.lock()?;
        let service = RecordService::with_config(&*db, self.config.clone());
        let patients = service.search_by(filter, order_by.as_deref(), descending)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient. Dates are ISO 8601 (`YYYY-MM-DD`), gender is
/// `Male` or `Female`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub gender: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            birth_date: patient.birth_date.format(DATE_FORMAT).to_string(),
            gender: patient.gender.to_string(),
        }
    }
}

impl TryFrom<FfiPatient> for PatientInput {
    type Error = PatientRecordsError;

    /// Blank date or gender is left missing for the validator; malformed
    /// values are reported together.
    fn try_from(patient: FfiPatient) -> Result<Self, Self::Error> {
        let mut violations = Vec::new();

        let birth_date = match patient.birth_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    violations.push(Violation::field(
                        Field::BirthDate,
                        format!("is not a valid date: '{}'", raw),
                    ));
                    None
                }
            },
        };

        let gender = match import::parse_gender(&patient.gender) {
            Ok(gender) => gender,
            Err(e) => {
                violations.push(Violation::field(Field::Gender, e.reason()));
                None
            }
        };

        if !violations.is_empty() {
            return Err(RecordError::Invalid(violations).into());
        }

        Ok(PatientInput {
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            birth_date,
            gender,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_ann() -> FfiPatient {
        FfiPatient {
            id: None,
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            birth_date: "1990-01-01".into(),
            gender: "Female".into(),
        }
    }

    #[test]
    fn test_ffi_round_trip() {
        let core = open_database_in_memory().unwrap();
        let created = core.create_patient(ffi_ann()).unwrap();
        let id = created.id.unwrap();

        let fetched = core.get_patient(id).unwrap().unwrap();
        assert_eq!(fetched.birth_date, "1990-01-01");
        assert_eq!(fetched.gender, "Female");
    }

    #[test]
    fn test_ffi_reports_malformed_fields_together() {
        let core = open_database_in_memory().unwrap();
        let mut patient = ffi_ann();
        patient.birth_date = "01.01.1990".into();
        patient.gender = "x".into();

        match core.create_patient(patient) {
            Err(PatientRecordsError::ValidationError { violations }) => {
                assert_eq!(violations.len(), 2);
                assert!(violations[0].starts_with("Birthday"));
                assert!(violations[1].starts_with("Gender"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_ffi_upload_and_search() {
        let core = open_database_in_memory().unwrap();
        let count = core
            .upload_csv(b"First Name,Last Name,Birthday,Gender\nAnn,Lee,1990-01-01,Female\nBo,Smith,1985-05-05,Male\n".to_vec())
            .unwrap();
        assert_eq!(count, 2);

        let results = core
            .search_patients(Some("SMI".into()), None, false)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].first_name, "Bo");

        let sorted = core
            .search_patients(None, Some("LastName".into()), true)
            .unwrap();
        assert_eq!(sorted[0].last_name, "Smith");
    }

    #[test]
    fn test_ffi_rejects_unknown_sort_field() {
        let core = open_database_in_memory().unwrap();
        let result = core.search_patients(None, Some("Birthday".into()), false);
        assert!(matches!(result, Err(PatientRecordsError::InvalidInput(_))));
    }

    #[test]
    fn test_ffi_update_mismatch() {
        let core = open_database_in_memory().unwrap();
        let created = core.create_patient(ffi_ann()).unwrap();
        let id = created.id.unwrap();

        let mut payload = created.clone();
        payload.id = Some(id + 1);
        let result = core.update_patient(id, payload);
        assert!(matches!(result, Err(PatientRecordsError::InvalidInput(_))));

        let missing = FfiPatient {
            id: Some(999),
            ..ffi_ann()
        };
        let result = core.update_patient(999, missing);
        assert!(matches!(result, Err(PatientRecordsError::NotFound(_))));
    }
}
