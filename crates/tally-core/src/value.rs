//! # Field Values
//!
//! Every editable numeric field of the entry form holds a [`FieldValue`]:
//! either a settled number or the raw text of a formula the operator is
//! still typing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  keystroke "12"     ──► Numeric(12.0)                                   │
//! │  keystroke "=3*4"   ──► PendingFormula("=3*4")   safe_num() == 0        │
//! │  blur (commit)      ──► evaluate("=3*4") == "12" ──► Numeric(12.0)      │
//! │  keystroke "abc"    ──► Numeric(0.0)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Consumers needing a number call [`FieldValue::safe_num`], which is total:
//! it never yields `NaN` or infinity.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::amount::format_amount;

/// Prefix marking a field's text as a formula.
pub const FORMULA_PREFIX: char = '=';

/// Returns true when the text is a formula the operator has not committed.
pub fn is_pending_formula(raw: &str) -> bool {
    raw.trim_start().starts_with(FORMULA_PREFIX)
}

/// Coerces operator text to a finite number.
///
/// - empty or whitespace-only text → `0`
/// - pending formula → `0`
/// - unparsable or non-finite text → `0`
///
/// ## Example
/// ```rust
/// use tally_core::value::to_safe_number;
///
/// assert_eq!(to_safe_number(" 12.5 "), 12.5);
/// assert_eq!(to_safe_number("=1+1"), 0.0);
/// assert_eq!(to_safe_number("abc"), 0.0);
/// assert_eq!(to_safe_number(""), 0.0);
/// ```
pub fn to_safe_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with(FORMULA_PREFIX) {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

// =============================================================================
// FieldValue
// =============================================================================

/// The value of one editable numeric field.
///
/// Serialized untagged: a JSON number for `Numeric`, a JSON string for
/// `PendingFormula`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum FieldValue {
    /// A settled number.
    Numeric(f64),
    /// Raw operator text beginning with `=`, not yet evaluated.
    PendingFormula(String),
}

impl FieldValue {
    /// Builds the value a field should hold for the given operator text.
    ///
    /// Formula text is kept verbatim; anything else is coerced with
    /// [`to_safe_number`].
    pub fn from_input(raw: &str) -> Self {
        if is_pending_formula(raw) {
            FieldValue::PendingFormula(raw.to_string())
        } else {
            FieldValue::Numeric(to_safe_number(raw))
        }
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        FieldValue::Numeric(0.0)
    }

    /// The numeric reading of this value; pending formulas read as `0`.
    #[inline]
    pub fn safe_num(&self) -> f64 {
        match self {
            FieldValue::Numeric(v) if v.is_finite() => *v,
            _ => 0.0,
        }
    }

    /// Returns true while the field holds an uncommitted formula.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, FieldValue::PendingFormula(_))
    }

    /// Display text for an input box: the formula text, or the number in
    /// minimal form.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Numeric(v) => format_amount(*v),
            FieldValue::PendingFormula(text) => text.clone(),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::zero()
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Numeric(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

// =============================================================================
// Lenient Deserialization
// =============================================================================

/// Deserializes a number that the backend may have stored as a JSON number,
/// a numeric string, an empty string or `null`.
///
/// Anything that does not read as a finite number becomes `0`.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(v)) if v.is_finite() => v,
        Some(Raw::Text(text)) => to_safe_number(&text),
        _ => 0.0,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_safe_number() {
        assert_eq!(to_safe_number("42"), 42.0);
        assert_eq!(to_safe_number("  3.25 "), 3.25);
        assert_eq!(to_safe_number("-7"), -7.0);
        assert_eq!(to_safe_number(""), 0.0);
        assert_eq!(to_safe_number("   "), 0.0);
        assert_eq!(to_safe_number("12abc"), 0.0);
        assert_eq!(to_safe_number("=5*5"), 0.0);
        assert_eq!(to_safe_number("1e400"), 0.0);
        assert_eq!(to_safe_number("NaN"), 0.0);
    }

    #[test]
    fn test_from_input_tags_formulas() {
        assert_eq!(
            FieldValue::from_input("=1+2"),
            FieldValue::PendingFormula("=1+2".to_string())
        );
        assert_eq!(FieldValue::from_input(" =1"), FieldValue::PendingFormula(" =1".to_string()));
        assert_eq!(FieldValue::from_input("8"), FieldValue::Numeric(8.0));
        assert_eq!(FieldValue::from_input("oops"), FieldValue::Numeric(0.0));
    }

    #[test]
    fn test_safe_num_is_total() {
        assert_eq!(FieldValue::Numeric(2.5).safe_num(), 2.5);
        assert_eq!(FieldValue::PendingFormula("=2".to_string()).safe_num(), 0.0);
        assert_eq!(FieldValue::Numeric(f64::NAN).safe_num(), 0.0);
        assert_eq!(FieldValue::Numeric(f64::INFINITY).safe_num(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Numeric(3.0).display(), "3");
        assert_eq!(FieldValue::Numeric(0.5).display(), "0.5");
        assert_eq!(FieldValue::PendingFormula("=1+".to_string()).display(), "=1+");
    }

    #[test]
    fn test_untagged_serde() {
        let json = serde_json::to_string(&FieldValue::Numeric(4.0)).unwrap();
        assert_eq!(json, "4.0");
        let back: FieldValue = serde_json::from_str("\"=2*3\"").unwrap();
        assert_eq!(back, FieldValue::PendingFormula("=2*3".to_string()));
        let number: FieldValue = serde_json::from_str("12").unwrap();
        assert_eq!(number, FieldValue::Numeric(12.0));
    }

    #[derive(Deserialize)]
    struct Lenient {
        #[serde(deserialize_with = "lenient_number", default)]
        qty: f64,
    }

    #[test]
    fn test_lenient_number() {
        let cases = [
            (r#"{"qty": 3}"#, 3.0),
            (r#"{"qty": "3"}"#, 3.0),
            (r#"{"qty": ""}"#, 0.0),
            (r#"{"qty": "0"}"#, 0.0),
            (r#"{"qty": null}"#, 0.0),
            (r#"{"qty": "x"}"#, 0.0),
            (r#"{}"#, 0.0),
        ];
        for (json, expected) in cases {
            let parsed: Lenient = serde_json::from_str(json).unwrap();
            assert_eq!(parsed.qty, expected, "input: {}", json);
        }
    }
}
