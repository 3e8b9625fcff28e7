//! Manual email entry rules.

use once_cell::sync::Lazy;
use regex::Regex;

static UIC_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@uic\.edu$").expect("valid uic.edu pattern"));

static GMAIL_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@gmail\.com$").expect("valid gmail.com pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("Empty email")]
    Empty,
    #[error("Please enter full uic.edu email or gmail.com email")]
    UnsupportedDomain,
}

/// Accept only full `@uic.edu` or `@gmail.com` addresses.
pub fn validate_manual_email(input: &str) -> Result<&str, EmailError> {
    let email = input.trim();
    if email.is_empty() {
        return Err(EmailError::Empty);
    }
    if !UIC_EMAIL.is_match(email) && !GMAIL_EMAIL.is_match(email) {
        return Err(EmailError::UnsupportedDomain);
    }
    Ok(email)
}
