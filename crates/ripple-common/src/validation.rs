//! Input validation utilities.
//!
//! Centralized validation helpers used across API routes.

use validator::Validate;

use crate::error::RippleError;

/// Validate a request body, returning a RippleError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), RippleError> {
    body.validate().map_err(|e| RippleError::Validation {
        message: format_validation_errors(e),
    })
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    errors
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
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
    }

    #[test]
    fn short_field_produces_validation_error() {
        let err = validate_request(&Probe { name: "ab".into() }).unwrap_err();
        match err {
            RippleError::Validation { message } => assert!(message.contains("too short")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn valid_body_passes() {
        assert!(validate_request(&Probe { name: "abc".into() }).is_ok());
    }
}
