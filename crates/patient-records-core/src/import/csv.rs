//! Delimited text reader.
//!
//! Follows RFC 4180 quoting: a field starting with `"` may contain the
//! delimiter, line breaks, and doubled quotes. Unquoted fields are taken
//! literally. Both LF and CRLF end a record.

use super::ImportError;

/// One physical record of a delimited document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// 1-based line on which the record starts
    pub line: usize,
    pub fields: Vec<String>,
}

impl CsvRecord {
    /// A line with nothing on it.
    pub fn is_blank(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].is_empty()
    }
}

/// Split `text` into records. Blank lines are dropped.
pub fn read_records(text: &str, delimiter: u8) -> Result<Vec<CsvRecord>, ImportError> {
    let delimiter = delimiter as char;
    let mut records = Vec::new();
    let mut chars = text.chars().peekable();

    let mut line = 1;
    let mut record_line = 1;
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted_field = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted_field => {
                in_quotes = true;
                quoted_field = true;
            }
            c if c == delimiter => {
                fields.push(std::mem::take(&mut field));
                quoted_field = false;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields), quoted_field);
                quoted_field = false;
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ImportError::UnterminatedQuote { line: record_line });
    }

    if !field.is_empty() || !fields.is_empty() || quoted_field {
        fields.push(field);
        push_record(&mut records, record_line, fields, quoted_field);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<CsvRecord>, line: usize, fields: Vec<String>, quoted: bool) {
    let record = CsvRecord { line, fields };
    // `""` on its own line is an empty value, not a blank line
    if quoted || !record.is_blank() {
        records.push(record);
    }
}
