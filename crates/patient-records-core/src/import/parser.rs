//! Batch parser: turns an uploaded document into candidate rows.

use chrono::{NaiveDate, NaiveDateTime};

use super::csv::{read_records, CsvRecord};
use super::{ImportError, ParseError, ParsedRow};
use crate::config::ImportConfig;
use crate::models::{Gender, PatientInput};
use crate::validation::Field;

/// Accepted header spellings per field, compared case-insensitively.
const HEADER_ALIASES: &[(Field, &[&str])] = &[
    (Field::FirstName, &["first name", "firstname"]),
    (Field::LastName, &["last name", "lastname"]),
    (
        Field::BirthDate,
        &["birthday", "birth date", "birthdate", "date of birth", "dob"],
    ),
    (Field::Gender, &["gender", "sex"]),
];

/// Positions of the recognized columns in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    first_name: usize,
    last_name: usize,
    birth_date: usize,
    gender: usize,
    width: usize,
}

impl ColumnMap {
    fn from_header(header: &CsvRecord) -> Result<Self, ImportError> {
        let position = |field: Field| {
            let aliases = HEADER_ALIASES
                .iter()
                .find(|(f, _)| *f == field)
                .map(|(_, aliases)| *aliases)
                .unwrap_or(&[]);
            header
                .fields
                .iter()
                .position(|name| aliases.contains(&normalize_header(name).as_str()))
        };

        let positions: Vec<(Field, Option<usize>)> =
            Field::ALL.into_iter().map(|f| (f, position(f))).collect();

        let missing: Vec<String> = positions
            .iter()
            .filter(|(_, pos)| pos.is_none())
            .map(|(field, _)| field.label().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        let at = |field: Field| {
            positions
                .iter()
                .find(|(f, _)| *f == field)
                .and_then(|(_, pos)| *pos)
                .unwrap_or_default()
        };

        Ok(Self {
            first_name: at(Field::FirstName),
            last_name: at(Field::LastName),
            birth_date: at(Field::BirthDate),
            gender: at(Field::Gender),
            width: header.fields.len(),
        })
    }
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parser for uploaded patient files.
#[derive(Debug, Clone, Default)]
pub struct BatchParser {
    config: ImportConfig,
}

impl BatchParser {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse a whole upload.
    ///
    /// Every non-blank data line yields exactly one [`ParsedRow`]; problems
    /// with individual values are recorded on the row, never dropped. Fails
    /// only when the document as a whole cannot be read.
    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<ParsedRow>, ImportError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ImportError::Encoding)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut records = read_records(text, self.config.delimiter())?.into_iter();
        let Some(header) = records.next() else {
            return Ok(Vec::new());
        };
        let columns = ColumnMap::from_header(&header)?;

        Ok(records
            .enumerate()
            .map(|(index, record)| self.parse_row(index + 1, &record, &columns))
            .collect())
    }

    fn parse_row(&self, row: usize, record: &CsvRecord, columns: &ColumnMap) -> ParsedRow {
        if record.fields.len() != columns.width {
            return ParsedRow {
                row,
                input: PatientInput::default(),
                errors: vec![ParseError::ColumnCount {
                    expected: columns.width,
                    found: record.fields.len(),
                }],
            };
        }

        let cell = |index: usize| record.fields[index].as_str();
        let mut errors = Vec::new();

        let birth_date = self
            .parse_date(cell(columns.birth_date))
            .unwrap_or_else(|e| {
                errors.push(e);
                None
            });
        let gender = parse_gender(cell(columns.gender)).unwrap_or_else(|e| {
            errors.push(e);
            None
        });

        let input = PatientInput {
            id: None,
            first_name: cell(columns.first_name).to_string(),
            last_name: cell(columns.last_name).to_string(),
            birth_date,
            gender,
        }
        .trimmed();

        ParsedRow { row, input, errors }
    }

    /// Parse a date cell with the configured formats. An empty cell is missing,
    /// not malformed.
    pub fn parse_date(&self, raw: &str) -> Result<Option<NaiveDate>, ParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        self.config
            .date_formats()
            .iter()
            .find_map(|format| {
                NaiveDate::parse_from_str(raw, format)
                    .or_else(|_| NaiveDateTime::parse_from_str(raw, format).map(|dt| dt.date()))
                    .ok()
            })
            .map(Some)
            .ok_or_else(|| ParseError::InvalidDate {
                value: raw.to_string(),
            })
    }
}

/// Parse a gender cell. An empty cell is missing, not malformed.
pub fn parse_gender(raw: &str) -> Result<Option<Gender>, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Gender>()
        .map(Some)
        .map_err(|value| ParseError::UnknownGender { value })
}
