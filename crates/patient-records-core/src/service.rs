//! Record service: create, update, upload and search patients.
//!
//! Each call is independent. The service borrows a store for the duration of
//! a request and keeps no state between calls.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::db::{DbError, PatientStore};
use crate::import::{BatchParser, BulkWriter};
use crate::models::{Patient, PatientInput, SearchCriteria, UnsupportedSortField};
use crate::query;
use crate::validation::{join_violations, validate_batch, validate_input, BatchValidation, Violation};

/// Record service errors.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Validation errors occurred: {}", join_violations(.0))]
    Invalid(Vec<Violation>),

    #[error("Patient ID mismatch: expected {expected}, payload has {}", describe_id(.found))]
    IdentityMismatch { expected: i64, found: Option<i64> },

    #[error("Patient not found: {0}")]
    NotFound(i64),

    #[error(transparent)]
    UnsupportedSortField(#[from] UnsupportedSortField),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

fn describe_id(id: &Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string())
}

impl RecordError {
    /// Violations carried by a rejected record or upload.
    pub fn violations(&self) -> &[Violation] {
        match self {
            RecordError::Invalid(violations) => violations.as_slice(),
            _ => &[],
        }
    }
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Orchestrates parsing, validation, persistence and queries.
pub struct RecordService<'a, S: PatientStore + ?Sized> {
    store: &'a S,
    parser: BatchParser,
}

impl<'a, S: PatientStore + ?Sized> RecordService<'a, S> {
    /// Create a service with the default import settings.
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, ImportConfig::default())
    }

    pub fn with_config(store: &'a S, config: ImportConfig) -> Self {
        Self {
            store,
            parser: BatchParser::new(config),
        }
    }

    fn config(&self) -> &ImportConfig {
        self.parser.config()
    }

    /// Validate and insert one record. Any identity on the input is ignored.
    pub fn create(&self, input: PatientInput) -> RecordResult<Patient> {
        let input = PatientInput { id: None, ..input };
        let patient = validate_input(input, self.config()).map_err(RecordError::Invalid)?;
        let id = self.store.insert_one(&patient)?;
        info!(patient_id = id, "patient created");
        Ok(patient.with_id(id))
    }

    /// Replace the record `id` with `input`.
    ///
    /// The payload must carry the same identity as the target; a mismatch is
    /// rejected rather than treated as a rename. A missing target is
    /// [`RecordError::NotFound`], never an insert.
    pub fn update(&self, id: i64, input: PatientInput) -> RecordResult<Patient> {
        if input.id != Some(id) {
            warn!(patient_id = id, payload_id = ?input.id, "patient update rejected: id mismatch");
            return Err(RecordError::IdentityMismatch {
                expected: id,
                found: input.id,
            });
        }

        let patient = validate_input(input, self.config()).map_err(RecordError::Invalid)?;
        match self.store.replace_one(id, &patient) {
            Ok(()) => {
                info!(patient_id = id, "patient updated");
                Ok(patient)
            }
            Err(DbError::NotFound(_)) => Err(RecordError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Import an uploaded file.
    ///
    /// Every row is parsed and validated before anything is written. If any
    /// row has a problem, the upload fails with every violation and the store
    /// is not touched. Otherwise all rows are committed in one transaction.
    /// Returns the number of records written.
    pub fn upload(&self, bytes: &[u8]) -> RecordResult<usize> {
        let rows = self.parser.parse(bytes).map_err(|e| {
            warn!(error = %e, "upload rejected: unreadable document");
            RecordError::Invalid(vec![Violation::document(e.to_string())])
        })?;

        let row_count = rows.len();
        match validate_batch(rows, self.config()) {
            BatchValidation::Invalid(violations) => {
                warn!(
                    rows = row_count,
                    violations = violations.len(),
                    "upload rejected: validation failed"
                );
                Err(RecordError::Invalid(violations))
            }
            BatchValidation::Valid(batch) => Ok(BulkWriter::new(self.store).write(&batch)?),
        }
    }

    /// Filtered and ordered listing of the stored records.
    pub fn search(&self, criteria: &SearchCriteria) -> RecordResult<Vec<Patient>> {
        let records = self.store.read_all()?;
        let total = records.len();
        let results = query::search(records, criteria);
        debug!(total, matched = results.len(), "patient search");
        Ok(results)
    }

    /// Search from loose request parameters, as sent by a listing page.
    pub fn search_by(
        &self,
        filter: Option<String>,
        order_by: Option<&str>,
        descending: bool,
    ) -> RecordResult<Vec<Patient>> {
        let criteria = SearchCriteria::from_params(filter, order_by, descending)?;
        self.search(&criteria)
    }

    pub fn get(&self, id: i64) -> RecordResult<Option<Patient>> {
        Ok(self.store.get(id)?)
    }
}
