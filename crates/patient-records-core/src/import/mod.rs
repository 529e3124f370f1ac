//! Bulk upload of patient records.
//!
//! Pipeline: bytes → [`csv`] records → [`BatchParser`] rows →
//! [`crate::validation::validate_batch`] → [`BulkWriter`]

pub mod csv;
mod parser;
mod writer;

pub use parser::*;
pub use writer::*;

use thiserror::Error;

use crate::models::PatientInput;
use crate::validation::Field;

/// Problems that make a whole document unreadable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("File is not valid UTF-8 text")]
    Encoding,

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
}

/// A malformed value in one data row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Row has {found} columns, expected {expected}")]
    ColumnCount { expected: usize, found: usize },

    #[error("Invalid birth date: '{value}'")]
    InvalidDate { value: String },

    #[error("Unrecognized gender: '{value}'")]
    UnknownGender { value: String },
}

impl ParseError {
    /// Field the bad value belongs to; `None` when the row itself is malformed.
    pub fn field(&self) -> Option<Field> {
        match self {
            ParseError::ColumnCount { .. } => None,
            ParseError::InvalidDate { .. } => Some(Field::BirthDate),
            ParseError::UnknownGender { .. } => Some(Field::Gender),
        }
    }

    /// Reason text, phrased to follow the field label.
    pub fn reason(&self) -> String {
        match self {
            ParseError::ColumnCount { expected, found } => {
                format!("expected {} columns, found {}", expected, found)
            }
            ParseError::InvalidDate { value } => format!("is not a valid date: '{}'", value),
            ParseError::UnknownGender { value } => {
                format!("is not a recognized value: '{}' (expected Male or Female)", value)
            }
        }
    }
}

/// One data row of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    /// 1-based position among the data rows
    pub row: usize,
    /// Everything that could be read from the row
    pub input: PatientInput,
    pub errors: Vec<ParseError>,
}

impl ParsedRow {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
