//! REST API module.
//!
//! Handlers answer in plain text, except record reads which return JSON.

mod forms;
mod identity;

pub use forms::*;
pub use identity::*;

/// Response type for every handler.
pub type ApiResult<T> = Result<T, crate::errors::AppError>;
