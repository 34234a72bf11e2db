//! # Session Error Types
//!
//! Error types for entry session operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Domain      │  │   Collaborator  │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core           │  │  Backend        │  │  InvalidConfig          │ │
//! │  │  DrawerLocked   │  │  (op + message) │  │  Io / Toml / Json       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error returned by a session operation leaves the session state as it
//! was before the call, so the operator can retry.

use tally_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session error type.
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Ledger or validation error from tally-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Drawer and expense fields are read-only in credit mode.
    #[error("Drawer is locked while payment mode is credit")]
    DrawerLocked,

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// A remote collaborator call failed.
    #[error("{operation} failed: {message}")]
    Backend { operation: String, message: String },

    // =========================================================================
    // Configuration & Storage Errors
    // =========================================================================
    /// Invalid session configuration.
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML config file.
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Wraps a collaborator failure with the name of the failing operation.
    pub fn backend(operation: &str, err: BackendError) -> Self {
        SessionError::Backend {
            operation: operation.to_string(),
            message: err.message,
        }
    }

    /// Returns true when retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Backend { .. } | SessionError::Io(_))
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Core(CoreError::Validation(err))
    }
}

// =============================================================================
// Backend Error
// =============================================================================

/// Failure reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_carries_operation() {
        let err = SessionError::backend("submit_sale", BackendError::new("503 upstream"));
        assert_eq!(err.to_string(), "submit_sale failed: 503 upstream");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_validation_converts_through_core() {
        let err: SessionError = ValidationError::Required {
            field: "customer".to_string(),
        }
        .into();
        assert!(matches!(err, SessionError::Core(CoreError::Validation(_))));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Validation error: customer is required");
    }
}
