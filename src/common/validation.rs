//! User-input validation errors.
//!
//! These are raised where input enters the program (CLI arguments, the settings
//! store setters, word forms) and are reported there; stores never see invalid
//! values.

use thiserror::Error;

use super::constants::{MAXIMUM_HOME_RADIUS, MINIMUM_HOME_RADIUS};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} degrees (got {value})")]
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(
        "home radius must be between {} and {} meters (got {})",
        MINIMUM_HOME_RADIUS,
        MAXIMUM_HOME_RADIUS,
        .0
    )]
    RadiusOutOfRange(f64),

    #[error("{0} is required")]
    Required(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Check a user-entered home radius against the allowed range.
pub fn validate_radius(radius_m: f64) -> Result<f64, ValidationError> {
    if radius_m.is_finite() && (MINIMUM_HOME_RADIUS..=MAXIMUM_HOME_RADIUS).contains(&radius_m) {
        Ok(radius_m)
    } else {
        Err(ValidationError::RadiusOutOfRange(radius_m))
    }
}

/// Trim a required text field, rejecting blanks.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}
