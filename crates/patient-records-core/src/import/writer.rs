//! Bulk writer: commits a validated batch in one transaction.

use tracing::{info, warn};

use crate::db::{DbResult, PatientStore};
use crate::validation::ValidBatch;

/// Writes whole batches to a [`PatientStore`].
pub struct BulkWriter<'a, S: PatientStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PatientStore + ?Sized> BulkWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Commit every record of `batch` or none of them.
    ///
    /// Returns the number of records written. An empty batch succeeds
    /// without touching the store.
    pub fn write(&self, batch: &ValidBatch) -> DbResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        match self.store.insert_many_atomic(batch.patients()) {
            Ok(()) => {
                info!(rows = batch.len(), "patient batch committed");
                Ok(batch.len())
            }
            Err(e) => {
                warn!(rows = batch.len(), error = %e, "patient batch rolled back");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::db::Database;
    use crate::import::BatchParser;
    use crate::validation::{validate_batch, BatchValidation};

    fn valid_batch(text: &str) -> ValidBatch {
        let rows = BatchParser::default().parse(text.as_bytes()).unwrap();
        match validate_batch(rows, &ImportConfig::default()) {
            BatchValidation::Valid(batch) => batch,
            BatchValidation::Invalid(v) => panic!("unexpected violations: {:?}", v),
        }
    }

    #[test]
    fn test_write_batch() {
        let db = Database::open_in_memory().unwrap();
        let batch = valid_batch(
            "First Name,Last Name,Birthday,Gender\nAnn,Lee,1990-01-01,Female\nBo,Kim,1985-05-05,Male\n",
        );

        let written = BulkWriter::new(&db).write(&batch).unwrap();
        assert_eq!(written, 2);

        let stored = db.read_all().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].first_name, "Ann");
        assert_eq!(stored[1].first_name, "Bo");
    }

    #[test]
    fn test_write_empty_batch() {
        let db = Database::open_in_memory().unwrap();
        let batch = valid_batch("First Name,Last Name,Birthday,Gender\n");
        assert_eq!(BulkWriter::new(&db).write(&batch).unwrap(), 0);
        assert!(db.read_all().unwrap().is_empty());
    }
}
