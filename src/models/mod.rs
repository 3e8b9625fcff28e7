//! Data models for the check-in backend.
//!
//! Applicant records keep the camelCase field names of the stored documents.

mod applicant;
mod identity;

pub use applicant::*;
pub use identity::*;
