//! # Validation Module
//!
//! Checks applied at the edges of an entry session: catalog data coming in,
//! sale and print payloads going out.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  catalog fetch ──► validate_catalog_product ──► skip bad products       │
//! │                                                                         │
//! │  operator edits ──► (no validation: coerce, clamp, keep formula text)   │
//! │                                                                         │
//! │  submit sale ──► validate_customer ──► SaleSink                         │
//! │                                                                         │
//! │  print ──► validate_template_id ──► PrintService                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_customer, validate_template_id};
//!
//! assert!(validate_customer("Night market stall 7").is_ok());
//! assert!(validate_template_id("ledger-merged").is_ok());
//! assert!(validate_template_id("bad id").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::CatalogProduct;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest customer label the backend accepts.
pub const MAX_CUSTOMER_LEN: usize = 64;

/// Longest print template id.
pub const MAX_TEMPLATE_ID_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates the customer label of a sale.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
///
/// ## Returns
/// The trimmed label.
pub fn validate_customer(customer: &str) -> ValidationResult<String> {
    let customer = customer.trim();

    if customer.is_empty() {
        return Err(ValidationError::Required {
            field: "customer".to_string(),
        });
    }

    if customer.chars().count() > MAX_CUSTOMER_LEN {
        return Err(ValidationError::TooLong {
            field: "customer".to_string(),
            max: MAX_CUSTOMER_LEN,
        });
    }

    Ok(customer.to_string())
}

/// Validates a print template id.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Only ASCII letters, digits, hyphens, underscores
pub fn validate_template_id(template_id: &str) -> ValidationResult<()> {
    if template_id.is_empty() {
        return Err(ValidationError::Required {
            field: "template_id".to_string(),
        });
    }

    if template_id.len() > MAX_TEMPLATE_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "template_id".to_string(),
            max: MAX_TEMPLATE_ID_LEN,
        });
    }

    if !template_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "template_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product from the remote catalog before it becomes a row.
///
/// ## Rules
/// - `id` and `name` must not be blank
/// - `stock`, `original_stock` and `price` must be finite
pub fn validate_catalog_product(product: &CatalogProduct) -> ValidationResult<()> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product.id".to_string(),
        });
    }

    if product.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product.name".to_string(),
        });
    }

    for (field, value) in [
        ("product.stock", product.stock),
        ("product.original_stock", product.original_stock),
        ("product.price", product.price),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
