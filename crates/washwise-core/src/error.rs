//! # Error Types
//!
//! Domain-specific error types for washwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  washwise-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  washwise-db errors                                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  washwise-sync errors                                                  │
//! │  └── SyncError        - Remote API, config and scheduling failures     │
//! │                                                                         │
//! │  apps/server                                                           │
//! │  └── ApiError         - What HTTP clients see (JSON body)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Machine is not known to the local store.
    ///
    /// ## When This Occurs
    /// - The id was never listed by the vending platform
    /// - The machine list pass has not discovered it yet
    #[error("Machine not found: {0}")]
    MachineNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised for identifiers coming from the vending platform as well as from
/// HTTP query parameters.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric machine id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CoreError::MachineNotFound(42).to_string(),
            "Machine not found: 42"
        );

        let err = ValidationError::InvalidFormat {
            field: "machineId".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "machineId has invalid format: not a number");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "shopId".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
