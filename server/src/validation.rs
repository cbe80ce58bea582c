//! Request validation for the Upkeep API
//!
//! Small field validators shared by the create/update handlers.

use crate::error::{validation_error, AppError};

/// Validation result type
pub type ValidationResult<T> = Result<T, AppError>;

/// String validation helpers
pub mod string {
    use super::*;

    /// Validate required non-empty string
    pub fn required(value: &Option<String>, field: &str) -> ValidationResult<String> {
        match value {
            Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Some(_) => Err(validation_error(field, &format!("{} cannot be empty", field))),
            None => Err(validation_error(field, &format!("{} is required", field))),
        }
    }

    /// Validate optional string with max length
    pub fn max_length(
        value: &Option<String>,
        field: &str,
        max: usize,
    ) -> ValidationResult<Option<String>> {
        match value {
            Some(s) if s.len() > max => Err(validation_error(
                field,
                &format!("{} must be {} characters or less", field, max),
            )),
            Some(s) => Ok(Some(s.trim().to_string())),
            None => Ok(None),
        }
    }
}

/// Validate that a value belongs to a fixed vocabulary (ticket status,
/// priority, plan status).
pub fn one_of(value: &str, field: &str, allowed: &[&str]) -> ValidationResult<String> {
    let v = value.trim();
    if allowed.contains(&v) {
        Ok(v.to_string())
    } else {
        Err(validation_error(
            field,
            &format!("{} must be one of: {}", field, allowed.join(", ")),
        ))
    }
}
