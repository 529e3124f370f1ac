//! SQLite schema definition.

/// Complete database schema for patient records.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL CHECK (length(trim(first_name)) > 0),
    last_name TEXT NOT NULL CHECK (length(trim(last_name)) > 0),
    birth_date TEXT NOT NULL,                    -- ISO 8601 date (YYYY-MM-DD)
    gender TEXT NOT NULL CHECK (gender IN ('Male', 'Female')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_first_name ON patients(first_name);
CREATE INDEX IF NOT EXISTS idx_patients_last_name ON patients(last_name);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_name_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Blank first name should fail
        let result = conn.execute(
            "INSERT INTO patients (first_name, last_name, birth_date, gender) VALUES ('  ', 'Lee', '1990-01-01', 'Female')",
            [],
        );
        assert!(result.is_err());

        // Valid row should succeed
        let result = conn.execute(
            "INSERT INTO patients (first_name, last_name, birth_date, gender) VALUES ('Ann', 'Lee', '1990-01-01', 'Female')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_gender_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO patients (first_name, last_name, birth_date, gender) VALUES ('Ann', 'Lee', '1990-01-01', 'Other')",
            [],
        );
        assert!(result.is_err());
    }
}
