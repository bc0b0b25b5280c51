//! Input validation utilities.
//!
//! Centralized validation helpers used across API routes.

use validator::Validate;

use crate::error::HubError;

/// Validate a request body, returning a HubError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), HubError> {
    body.validate().map_err(|e| HubError::Validation {
        message: format_validation_errors(e),
    })
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Reject names that are empty once trimmed.
pub fn validate_name(name: &str) -> Result<(), HubError> {
    if name.trim().is_empty() {
        return Err(HubError::Validation {
            message: "Name cannot be empty or whitespace only".into(),
        });
    }
    Ok(())
}

/// Board columns must be non-empty, unique, and non-blank.
pub fn validate_columns(columns: &[String]) -> Result<(), HubError> {
    if columns.is_empty() {
        return Err(HubError::Validation {
            message: "A board needs at least one column".into(),
        });
    }
    let mut seen = std::collections::HashSet::new();
    for column in columns {
        validate_name(column)?;
        if !seen.insert(column.as_str()) {
            return Err(HubError::Validation {
                message: format!("Duplicate column '{column}'"),
            });
        }
    }
    Ok(())
}
