//! Database layer for patient records.

mod schema;
mod patients;

pub use schema::*;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use thiserror::Error;

use crate::models::Patient;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// Classify a SQLite error, separating constraint failures.
    pub(crate) fn classify(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            if err.code == ErrorCode::ConstraintViolation {
                return DbError::Constraint(msg.clone().unwrap_or_else(|| err.to_string()));
            }
        }
        DbError::Sqlite(e)
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Persistent store for patient records.
///
/// `insert_many_atomic` must make either every record visible or none.
pub trait PatientStore {
    /// Insert one record, returning its assigned identity.
    fn insert_one(&self, patient: &Patient) -> DbResult<i64>;

    /// Insert all records in a single transaction.
    fn insert_many_atomic(&self, patients: &[Patient]) -> DbResult<()>;

    /// Overwrite the record with identity `id`. Fails with
    /// [`DbError::NotFound`] when it does not exist.
    fn replace_one(&self, id: i64, patient: &Patient) -> DbResult<()>;

    /// Every record, in insertion order.
    fn read_all(&self) -> DbResult<Vec<Patient>>;

    fn get(&self, id: i64) -> DbResult<Option<Patient>>;
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"patients".to_string()));
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.db");

        Database::open(&path).unwrap();
        let db = Database::open(&path).unwrap();
        assert!(db.read_all().unwrap().is_empty());
    }
}
