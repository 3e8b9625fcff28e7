//! Admin console: look up an applicant, check acceptance, record meals.
//!
//! The console holds at most one current record. Every failed lookup clears it,
//! so meal edits can only ever target a fully accepted applicant.

mod client;
mod email;
mod scanner;

pub use client::*;
pub use email::*;
pub use scanner::*;

use crate::models::{ApplicantRecord, MealField, MealFlags, UpdateFoodRequest};

/// Shown for any transport or decoding failure during a lookup.
pub const LOOKUP_FAILED: &str = "Something is wrong with scanner";

/// Result of one lookup, by scan or by typed email.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Fully accepted; the record is now editable
    Ready(ApplicantRecord),
    /// Found but not fully accepted; carries `"<email>: <status>"`
    Blocked(String),
    /// No record, invalid input, or the server refused the request
    Rejected(String),
    /// Network or parsing failure
    Failed(String),
}

impl LookupOutcome {
    pub fn message(&self) -> String {
        match self {
            LookupOutcome::Ready(record) => record.status_line(),
            LookupOutcome::Blocked(msg)
            | LookupOutcome::Rejected(msg)
            | LookupOutcome::Failed(msg) => msg.clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LookupOutcome::Ready(_))
    }
}

/// Result of submitting the meal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Updated,
    NoRecord,
    Failed,
}

impl SubmitOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SubmitOutcome::Updated => "Updated Food data!",
            SubmitOutcome::NoRecord => "No user info",
            SubmitOutcome::Failed => "Failed to update food data",
        }
    }
}

/// The editable record: stored values plus the checkbox states being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRecord {
    pub record: ApplicantRecord,
    pub form: MealFlags,
}

impl CurrentRecord {
    fn new(record: ApplicantRecord) -> Self {
        let form = record.meals();
        Self { record, form }
    }

    /// Multi-line view of the record, edited and stored meal flags side by side.
    pub fn render(&self) -> String {
        let stored = self.record.meals();
        let mut out = format!(
            "Name: {}\nStatus: {}\nEmail: {}\n{:<24} current  old\n",
            self.record.full_name(),
            self.record.app_status,
            self.record.email,
            "Food data"
        );
        for field in MealField::ALL {
            out.push_str(&format!(
                "{:<24} {:<8} {}\n",
                field.label(),
                checkbox(self.form.get(field)),
                checkbox(stored.get(field)),
            ));
        }
        out
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Console state over some [`CheckinBackend`].
pub struct CheckinConsole<B> {
    backend: B,
    current: Option<CurrentRecord>,
    error: Option<String>,
}

impl<B: CheckinBackend> CheckinConsole<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: None,
            error: None,
        }
    }

    pub fn current(&self) -> Option<&CurrentRecord> {
        self.current.as_ref()
    }

    /// Last error shown next to the manual search box.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Look up the applicant behind a scanned code (a uid).
    pub async fn lookup_scanned(&mut self, code: &str) -> LookupOutcome {
        let email = match self.backend.resolve_email(code.trim()).await {
            Ok(email) => email,
            Err(ClientError::Rejected { status, message }) => {
                tracing::warn!(status, "Resolving scanned code refused: {}", message);
                return self.finish(LookupOutcome::Rejected(message));
            }
            Err(e) => {
                tracing::error!("Resolving scanned code failed: {}", e);
                return self.finish(LookupOutcome::Failed(LOOKUP_FAILED.to_string()));
            }
        };

        let outcome = self.load(&email).await;
        self.finish(outcome)
    }

    /// Look up the applicant by a typed email address.
    ///
    /// Invalid input is refused before any request and leaves the current
    /// record untouched.
    pub async fn lookup_email(&mut self, input: &str) -> LookupOutcome {
        let email = match validate_manual_email(input) {
            Ok(email) => email.to_string(),
            Err(e) => {
                self.error = Some(e.to_string());
                return LookupOutcome::Rejected(e.to_string());
            }
        };

        let outcome = self.load(&email).await;
        self.finish(outcome)
    }

    async fn load(&self, email: &str) -> LookupOutcome {
        match self.backend.fetch_record(email).await {
            Ok(None) => LookupOutcome::Rejected("No data found".to_string()),
            Ok(Some(record)) if !record.app_status.allows_meal_edits() => {
                LookupOutcome::Blocked(record.status_line())
            }
            Ok(Some(record)) => LookupOutcome::Ready(record),
            Err(ClientError::Rejected { status, message }) => {
                tracing::warn!(status, email = %email, "Fetching record refused: {}", message);
                LookupOutcome::Rejected(message)
            }
            Err(e) => {
                tracing::error!(email = %email, "Fetching record failed: {}", e);
                LookupOutcome::Failed(LOOKUP_FAILED.to_string())
            }
        }
    }

    fn finish(&mut self, outcome: LookupOutcome) -> LookupOutcome {
        match &outcome {
            LookupOutcome::Ready(record) => {
                self.current = Some(CurrentRecord::new(record.clone()));
                self.error = None;
            }
            other => {
                self.current = None;
                self.error = Some(other.message());
            }
        }
        outcome
    }

    /// Flip one checkbox; `None` without a current record.
    pub fn toggle(&mut self, field: MealField) -> Option<bool> {
        let current = self.current.as_mut()?;
        current.form.toggle(field);
        Some(current.form.get(field))
    }

    /// Set one checkbox; `None` without a current record.
    pub fn set_meal(&mut self, field: MealField, value: bool) -> Option<bool> {
        let current = self.current.as_mut()?;
        current.form.set(field, value);
        Some(value)
    }

    /// Send the checkbox states for the current record.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(current) = self.current.as_mut() else {
            return SubmitOutcome::NoRecord;
        };

        let request = UpdateFoodRequest {
            email: current.record.email.clone(),
            meals: current.form,
            checkin1: None,
            checkin2: None,
        };

        match self.backend.update_food(&request).await {
            Ok(()) => {
                current.record.set_meals(&request.meals);
                SubmitOutcome::Updated
            }
            Err(e) => {
                tracing::error!(email = %request.email, "Updating food data failed: {}", e);
                SubmitOutcome::Failed
            }
        }
    }
}
