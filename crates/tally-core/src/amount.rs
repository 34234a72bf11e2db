//! # Amount Module
//!
//! Rounding and display helpers for the plain `f64` amounts that flow
//! through the ledger (quantities, prices, subtotals, drawer totals).
//!
//! ## Canonical Display Form
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  value        round_to_cents     format_amount                          │
//! │  ─────        ──────────────     ─────────────                          │
//! │  3.0          3.0                "3"        (no ".0", no ".00")          │
//! │  3.5          3.5                "3.5"      (no trailing zero)           │
//! │  1/3          0.33               "0.33"                                 │
//! │  -0.001       -0.0               "0"        (negative zero folded)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::amount::{format_amount, round_to_cents};
//!
//! assert_eq!(format_amount(round_to_cents(7.0 / 2.0)), "3.5");
//! assert_eq!(format_amount(round_to_cents(6.0 / 2.0)), "3");
//! ```

/// Number of cents in one currency unit.
const CENTS_PER_UNIT: f64 = 100.0;

/// Rounds a value to 2 decimal places.
///
/// Ties round toward positive infinity (`2.5` cents → `3` cents,
/// `-2.5` cents → `-2` cents), matching the rounding the entry form has
/// always shown to operators.
///
/// ## Example
/// ```rust
/// use tally_core::amount::round_to_cents;
///
/// assert_eq!(round_to_cents(1.0 / 3.0), 0.33);
/// assert_eq!(round_to_cents(0.125), 0.13);
/// ```
pub fn round_to_cents(value: f64) -> f64 {
    let cents = (value * CENTS_PER_UNIT + 0.5).floor();
    let rounded = cents / CENTS_PER_UNIT;
    // Fold -0.0 so it never displays as "-0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Formats an amount in its minimal string form.
///
/// Whole numbers print without a fractional part; other values print the
/// shortest representation that round-trips. Negative zero prints as `"0"`.
pub fn format_amount(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Returns true when the value is numerically zero.
#[inline]
pub fn is_zero(value: f64) -> bool {
    value == 0.0
}

// =============================================================================
// Unit Tests
// =============================================================================
