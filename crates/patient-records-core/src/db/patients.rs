//! Patient database operations.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, PatientStore};
use crate::models::{Gender, Patient, DATE_FORMAT};

const SELECT_PATIENT: &str = r#"
    SELECT id, first_name, last_name, birth_date, gender
    FROM patients
"#;

const INSERT_PATIENT: &str = r#"
    INSERT INTO patients (first_name, last_name, birth_date, gender)
    VALUES (?1, ?2, ?3, ?4)
"#;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let birth_date: String = row.get(3)?;
    let birth_date = NaiveDate::parse_from_str(&birth_date, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    let gender: String = row.get(4)?;
    let gender = gender.parse::<Gender>().map_err(|value| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown gender '{}'", value).into(),
        )
    })?;

    Ok(Patient {
        id: Some(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        birth_date,
        gender,
    })
}

fn date_text(patient: &Patient) -> String {
    patient.birth_date.format(DATE_FORMAT).to_string()
}

impl Database {
    /// Insert a new patient, returning the assigned ID.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn
            .execute(
                INSERT_PATIENT,
                params![
                    patient.first_name,
                    patient.last_name,
                    date_text(patient),
                    patient.gender.as_str(),
                ],
            )
            .map_err(DbError::classify)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert many patients in one transaction.
    ///
    /// The transaction rolls back on drop, so any failure leaves the table
    /// as it was.
    pub fn insert_patients(&self, patients: &[Patient]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_PATIENT)?;
            for patient in patients {
                stmt.execute(params![
                    patient.first_name,
                    patient.last_name,
                    date_text(patient),
                    patient.gender.as_str(),
                ])
                .map_err(DbError::classify)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace every field of an existing patient.
    pub fn update_patient(&self, id: i64, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE patients SET
                    first_name = ?2,
                    last_name = ?3,
                    birth_date = ?4,
                    gender = ?5,
                    updated_at = datetime('now')
                WHERE id = ?1
                "#,
                params![
                    id,
                    patient.first_name,
                    patient.last_name,
                    date_text(patient),
                    patient.gender.as_str(),
                ],
            )
            .map_err(DbError::classify)?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_PATIENT),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients in insertion order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id", SELECT_PATIENT))?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of stored patients.
    pub fn count_patients(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl PatientStore for Database {
    fn insert_one(&self, patient: &Patient) -> DbResult<i64> {
        self.insert_patient(patient)
    }

    fn insert_many_atomic(&self, patients: &[Patient]) -> DbResult<()> {
        self.insert_patients(patients)
    }

    fn replace_one(&self, id: i64, patient: &Patient) -> DbResult<()> {
        if self.update_patient(id, patient)? {
            Ok(())
        } else {
            Err(DbError::NotFound(format!("patient {}", id)))
        }
    }

    fn read_all(&self) -> DbResult<Vec<Patient>> {
        self.list_patients()
    }

    fn get(&self, id: i64) -> DbResult<Option<Patient>> {
        self.get_patient(id)
    }
}
