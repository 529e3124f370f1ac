//! Domain models for the patient records system.

mod patient;
mod search;

pub use patient::*;
pub use search::*;
