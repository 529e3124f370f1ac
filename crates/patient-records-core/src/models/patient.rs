//! Patient models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum length (in characters) of a first or last name.
pub const MAX_NAME_LEN: usize = 50;

/// Canonical text form of a birth date (ISO 8601).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Administrative gender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Canonical name, as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    /// Accepts the variant names (any case) and the legacy numeric codes
    /// `0` and `1` sent by older web clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "0" => Ok(Gender::Male),
            "female" | "1" => Ok(Gender::Female),
            _ => Err(s.to_string()),
        }
    }
}

/// A validated patient record.
///
/// Values of this type are produced by [`crate::validation::validate_input`]
/// or read back from the store, so every field satisfies the model constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    /// Store-assigned identity, `None` until inserted
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

impl Patient {
    /// "First Last", used when attributing messages to a record.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Copy of this record carrying the given identity.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// A candidate patient record, before validation.
///
/// `None` in `birth_date` or `gender` means the value was missing.
/// Malformed values never reach this type; they are parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientInput {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

impl PatientInput {
    /// Create a complete candidate without identity.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_date: NaiveDate,
        gender: Gender,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date: Some(birth_date),
            gender: Some(gender),
        }
    }

    /// Set the identity carried by an update payload.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Strip leading/trailing whitespace from the name fields.
    pub fn trimmed(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self
    }

    /// "First Last" of the (possibly invalid) candidate.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<Patient> for PatientInput {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            birth_date: Some(patient.birth_date),
            gender: Some(patient.gender),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_from_str() {
        assert_eq!("Male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(" FEMALE ".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("0".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("1".parse::<Gender>(), Ok(Gender::Female));
        assert!("unknown".parse::<Gender>().is_err());
        assert!("".parse::<Gender>().is_err());
    }

    #[test]
    fn test_trimmed_input() {
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let input = PatientInput::new("  Ann ", "\tLee", date, Gender::Female).trimmed();
        assert_eq!(input.first_name, "Ann");
        assert_eq!(input.last_name, "Lee");
        assert_eq!(input.display_name(), "Ann Lee");
    }

    #[test]
    fn test_input_from_patient() {
        let patient = Patient {
            id: Some(7),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: Gender::Female,
        };
        let input = PatientInput::from(patient.clone());
        assert_eq!(input.id, Some(7));
        assert_eq!(input.birth_date, Some(patient.birth_date));
        assert_eq!(input.gender, Some(Gender::Female));
    }
}
