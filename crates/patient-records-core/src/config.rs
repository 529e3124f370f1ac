//! Runtime configuration.
//!
//! Resolved once at startup and passed into the parser and service, so that
//! nothing reads environment variables while handling a request.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::MAX_NAME_LEN;

/// Environment variable naming the database file.
pub const DATABASE_ENV_VAR: &str = "PATIENT_RECORDS_DB";

/// Database file used when neither an argument nor the environment names one.
pub const DEFAULT_DATABASE_PATH: &str = "patients.db";

/// Date formats accepted in uploaded files, tried in order.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y-%m-%dT%H:%M:%S"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid delimiter: {0:?}")]
    InvalidDelimiter(char),

    #[error("At least one date format is required")]
    NoDateFormats,

    #[error("Maximum name length must be positive")]
    InvalidNameLength,
}

/// Settings for parsing and validating uploaded files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    delimiter: u8,
    date_formats: Vec<String>,
    max_name_len: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            max_name_len: MAX_NAME_LEN,
        }
    }
}

impl ImportConfig {
    pub fn new(
        delimiter: char,
        date_formats: Vec<String>,
        max_name_len: usize,
    ) -> Result<Self, ConfigError> {
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\r' | '\n') {
            return Err(ConfigError::InvalidDelimiter(delimiter));
        }
        if date_formats.is_empty() {
            return Err(ConfigError::NoDateFormats);
        }
        if max_name_len == 0 {
            return Err(ConfigError::InvalidNameLength);
        }
        Ok(Self {
            delimiter: delimiter as u8,
            date_formats,
            max_name_len,
        })
    }

    /// Same settings with a different field delimiter.
    pub fn with_delimiter(self, delimiter: char) -> Result<Self, ConfigError> {
        Self::new(delimiter, self.date_formats, self.max_name_len)
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn date_formats(&self) -> &[String] {
        &self.date_formats
    }

    pub fn max_name_len(&self) -> usize {
        self.max_name_len
    }
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct RecordsConfig {
    database_path: PathBuf,
    import: ImportConfig,
}

impl RecordsConfig {
    pub fn new(database_path: PathBuf, import: ImportConfig) -> Self {
        Self {
            database_path,
            import,
        }
    }

    /// Resolve the database path: explicit argument, then the
    /// `PATIENT_RECORDS_DB` environment variable, then `patients.db`.
    pub fn resolve(cli_database: Option<PathBuf>, import: ImportConfig) -> Self {
        let database_path = cli_database
            .or_else(|| std::env::var_os(DATABASE_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        Self::new(database_path, import)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn import(&self) -> &ImportConfig {
        &self.import
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_import_config() {
        let config = ImportConfig::default();
        assert_eq!(config.delimiter(), b',');
        assert_eq!(config.max_name_len(), 50);
        assert_eq!(config.date_formats()[0], "%Y-%m-%d");
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert_eq!(
            ImportConfig::new('"', vec!["%Y".into()], 50),
            Err(ConfigError::InvalidDelimiter('"'))
        );
        assert_eq!(
            ImportConfig::new('é', vec!["%Y".into()], 50),
            Err(ConfigError::InvalidDelimiter('é'))
        );
        assert_eq!(ImportConfig::new(';', vec![], 50), Err(ConfigError::NoDateFormats));
        assert_eq!(
            ImportConfig::new(';', vec!["%Y".into()], 0),
            Err(ConfigError::InvalidNameLength)
        );
    }

    #[test]
    fn test_with_delimiter() {
        let config = ImportConfig::default().with_delimiter(';').unwrap();
        assert_eq!(config.delimiter(), b';');
        assert_eq!(config.max_name_len(), 50);
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let config = RecordsConfig::resolve(Some("custom.db".into()), ImportConfig::default());
        assert_eq!(config.database_path(), Path::new("custom.db"));
    }
}
