//! Parameter Validation
//!
//! Two-stage checks guarding the estimator, the configuration stores and the
//! allocation builder:
//! 1. each numeric field against its declared range
//! 2. the cross-field rule `canopy_depth <= max_depth`
//!
//! The first violation found is returned. Input is never clamped.

use thiserror::Error;

use crate::types::{
    NewTreeConfiguration, TreeConfiguration, TreeParameters, ValidatedParameters,
    MAX_CANOPY_DEPTH, MAX_DESCRIPTION_LEN, MAX_MAX_BUFFER_SIZE, MAX_MAX_DEPTH, MAX_NAME_LEN,
    MIN_CANOPY_DEPTH, MIN_MAX_BUFFER_SIZE, MIN_MAX_DEPTH,
};

/// Name of the cross-field rule reported by [`ValidationError::InvariantViolation`]
pub const CANOPY_EXCEEDS_DEPTH: &str = "canopyDepth>maxDepth";

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field}: {value} is outside the allowed range {min}..={max}")]
    InvalidParameter {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invariant violated ({rule}): canopy depth {canopy_depth} exceeds max depth {max_depth}")]
    InvariantViolation {
        rule: &'static str,
        canopy_depth: i64,
        max_depth: i64,
    },

    #[error("invalid {field}: length {len} is outside the allowed range {min}..={max}")]
    InvalidText {
        field: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },
}

impl ValidationError {
    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidParameter { .. } => "INVALID_PARAMETER",
            ValidationError::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            ValidationError::InvalidText { .. } => "INVALID_PARAMETER",
        }
    }

    /// Offending field, where the error concerns a single field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidParameter { field, .. }
            | ValidationError::InvalidText { field, .. } => Some(field),
            ValidationError::InvariantViolation { .. } => None,
        }
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<u32, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::InvalidParameter {
            field,
            value,
            min,
            max,
        });
    }
    // Every declared range lies within u32
    Ok(value as u32)
}

fn check_text_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::InvalidText {
            field,
            len,
            min,
            max,
        });
    }
    Ok(())
}

/// Validate raw tree parameters
pub fn validate(params: &TreeParameters) -> Result<ValidatedParameters, ValidationError> {
    let canopy_depth = check_range(
        "canopyDepth",
        params.canopy_depth,
        MIN_CANOPY_DEPTH,
        MAX_CANOPY_DEPTH,
    )?;
    let max_depth = check_range("maxDepth", params.max_depth, MIN_MAX_DEPTH, MAX_MAX_DEPTH)?;
    let max_buffer_size = check_range(
        "maxBufferSize",
        params.max_buffer_size,
        MIN_MAX_BUFFER_SIZE,
        MAX_MAX_BUFFER_SIZE,
    )?;

    if canopy_depth > max_depth {
        return Err(ValidationError::InvariantViolation {
            rule: CANOPY_EXCEEDS_DEPTH,
            canopy_depth: params.canopy_depth,
            max_depth: params.max_depth,
        });
    }

    Ok(ValidatedParameters::new_unchecked(
        canopy_depth,
        max_depth,
        max_buffer_size,
        params.network,
    ))
}

fn validate_text(name: &str, description: Option<&str>) -> Result<(), ValidationError> {
    check_text_len("name", name, 1, MAX_NAME_LEN)?;
    if let Some(description) = description {
        check_text_len("description", description, 0, MAX_DESCRIPTION_LEN)?;
    }
    Ok(())
}

/// Validate a create payload: parameters first, then name and description
pub fn validate_new_configuration(
    new: &NewTreeConfiguration,
) -> Result<ValidatedParameters, ValidationError> {
    let params = validate(&new.parameters())?;
    validate_text(&new.name, new.description.as_deref())?;
    Ok(params)
}

/// Validate a configuration after a patch has been merged into it
pub fn validate_configuration(
    config: &TreeConfiguration,
) -> Result<ValidatedParameters, ValidationError> {
    let params = validate(&config.parameters())?;
    validate_text(&config.name, config.description.as_deref())?;
    Ok(params)
}
