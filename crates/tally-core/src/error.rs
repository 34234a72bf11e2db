//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Lookup failures, wrapped validation            │
//! │  └── ValidationError  - Payload / catalog validation failures          │
//! │                                                                         │
//! │  tally-session errors (separate crate)                                 │
//! │  └── SessionError     - Collaborator, config and storage failures      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → Frontend           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! Ledger editing never fails. Malformed numbers coerce to zero, broken
//! formulas keep their raw text and out-of-range quantities are clamped.
//! The variants below only cover lookups by identity and the validation
//! performed before a payload leaves the session.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core ledger errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No row in the current ledger carries this product id.
    ///
    /// ## When This Occurs
    /// - The frontend addresses a row that was dropped by a catalog reload
    /// - A cloned transaction references a product no longer in the catalog
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., template id with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is not usable (negative or non-finite).
    #[error("{field} is out of range: {reason}")]
    OutOfRange { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ProductNotFound("p-42".to_string());
        assert_eq!(err.to_string(), "Product not found: p-42");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer".to_string(),
        };
        assert_eq!(err.to_string(), "customer is required");

        let err = ValidationError::TooLong {
            field: "customer".to_string(),
            max: 64,
        };
        assert_eq!(err.to_string(), "customer must be at most 64 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "template_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
