//! Query engine: filter and order a patient listing.
//!
//! Everything here is a pure function of the records and the criteria, so
//! the same inputs always give the same sequence.

use crate::models::{Patient, SearchCriteria, SortDirection, SortField, SortSpec};

/// Apply `criteria` to `records`, which must be in store order.
pub fn search(records: Vec<Patient>, criteria: &SearchCriteria) -> Vec<Patient> {
    let mut results = filter_patients(records, criteria.filter.as_deref());
    if let Some(sort) = criteria.sort {
        sort_patients(&mut results, sort);
    }
    results
}

/// Keep records whose first or last name contains `filter`, ignoring case.
///
/// A missing or blank filter keeps everything.
pub fn filter_patients(records: Vec<Patient>, filter: Option<&str>) -> Vec<Patient> {
    let needle = match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => f.to_lowercase(),
        None => return records,
    };
    records
        .into_iter()
        .filter(|p| matches_filter(p, &needle))
        .collect()
}

/// `needle` must already be lower-cased.
fn matches_filter(patient: &Patient, needle: &str) -> bool {
    patient.first_name.to_lowercase().contains(needle)
        || patient.last_name.to_lowercase().contains(needle)
}

/// Stable sort: records with equal keys keep their relative order in both
/// directions.
pub fn sort_patients(records: &mut [Patient], sort: SortSpec) {
    records.sort_by(|a, b| {
        let ordering = sort_key(a, sort.field).cmp(sort_key(b, sort.field));
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn sort_key(patient: &Patient, field: SortField) -> &str {
    match field {
        SortField::FirstName => &patient.first_name,
        SortField::LastName => &patient.last_name,
    }
}
