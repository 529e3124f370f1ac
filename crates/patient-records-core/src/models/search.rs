//! Search criteria models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field a search can be ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortField {
    FirstName,
    LastName,
}

/// Rejected sort field name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported sort field: {0}")]
pub struct UnsupportedSortField(pub String);

impl FromStr for SortField {
    type Err = UnsupportedSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "firstname" => Ok(SortField::FirstName),
            "lastname" => Ok(SortField::LastName),
            _ => Err(UnsupportedSortField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Sort specification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

/// Filter and sort applied to a patient listing.
///
/// An absent filter or sort means no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Case-insensitive substring matched against first and last name
    pub filter: Option<String>,
    pub sort: Option<SortSpec>,
}

impl SearchCriteria {
    /// Criteria matching every record in store order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Build criteria from loosely-typed request parameters.
    ///
    /// `order_by` is a field name such as `FirstName`; any field other than
    /// the first or last name is rejected.
    pub fn from_params(
        filter: Option<String>,
        order_by: Option<&str>,
        descending: bool,
    ) -> Result<Self, UnsupportedSortField> {
        let sort = match order_by.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => {
                let field = name.parse::<SortField>()?;
                Some(if descending {
                    SortSpec::descending(field)
                } else {
                    SortSpec::ascending(field)
                })
            }
            None => None,
        };
        Ok(Self { filter, sort })
    }
}
