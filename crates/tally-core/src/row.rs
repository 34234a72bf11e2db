//! # Row Ledger
//!
//! One product's quantity/price state for the current transaction, and the
//! edit rule that keeps it inside its stock constraints.
//!
//! ## Row Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   0 ≤ picked   ≤ stock                                                  │
//! │   0 ≤ original ≤ original_stock                                         │
//! │   0 ≤ returns  ≤ picked + original                                      │
//! │                                                                         │
//! │   sold     = picked + original − returns                                │
//! │   subtotal = sold × price                                               │
//! │                                                                         │
//! │   (every read goes through safe_num: a pending formula counts as 0)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edit Flow
//! ```text
//! keystroke ──► apply_edit(raw)
//!                  │
//!                  ├── raw starts with '=' ──► store verbatim, stop
//!                  │
//!                  ├── coerce to_safe_number(raw)
//!                  ├── price? ──► PriceMemory::remember (fire-and-forget)
//!                  ├── clamp picked, original, then returns
//!                  └── recompute sold, subtotal
//!
//! blur ──► commit(raw) = apply_edit(evaluate(raw))
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::formula::evaluate;
use crate::ports::PriceMemory;
use crate::types::CatalogProduct;
use crate::value::{is_pending_formula, to_safe_number, FieldValue};

// =============================================================================
// Row Field
// =============================================================================

/// The editable columns of a row, in grid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum RowField {
    Picked,
    Original,
    Returns,
    Price,
}

impl RowField {
    /// Grid column order.
    pub const ORDER: [RowField; 4] = [
        RowField::Picked,
        RowField::Original,
        RowField::Returns,
        RowField::Price,
    ];

    /// Zero-based column index.
    pub fn index(&self) -> usize {
        match self {
            RowField::Picked => 0,
            RowField::Original => 1,
            RowField::Returns => 2,
            RowField::Price => 3,
        }
    }

    /// Column at a zero-based index.
    pub fn from_index(index: usize) -> Option<RowField> {
        RowField::ORDER.get(index).copied()
    }
}

// =============================================================================
// Product Row
// =============================================================================

/// One product line of the entry form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    pub product_id: String,
    pub name: String,
    /// Catalog ordering key; lower sorts first.
    pub sort_weight: i64,

    /// Ceiling for `picked` (new stock).
    pub stock: f64,
    /// Ceiling for `original` (returned/original stock pool).
    pub original_stock: f64,

    pub picked: FieldValue,
    pub original: FieldValue,
    pub returns: FieldValue,
    pub price: FieldValue,

    /// `picked + original − returns`.
    pub sold: f64,
    /// `sold × price`.
    pub subtotal: f64,
}

impl ProductRow {
    /// Materializes an empty row from a catalog product.
    ///
    /// The remembered price wins over the catalog price when present.
    pub fn from_catalog(product: &CatalogProduct, remembered_price: Option<f64>) -> Self {
        let price = remembered_price
            .filter(|p| p.is_finite())
            .unwrap_or(product.price);
        ProductRow {
            product_id: product.id.clone(),
            name: product.name.clone(),
            sort_weight: product.sort_weight,
            stock: product.stock,
            original_stock: product.original_stock,
            picked: FieldValue::zero(),
            original: FieldValue::zero(),
            returns: FieldValue::zero(),
            price: FieldValue::Numeric(price),
            sold: 0.0,
            subtotal: 0.0,
        }
    }

    /// The stored value of a column.
    pub fn field(&self, field: RowField) -> &FieldValue {
        match field {
            RowField::Picked => &self.picked,
            RowField::Original => &self.original,
            RowField::Returns => &self.returns,
            RowField::Price => &self.price,
        }
    }

    fn field_mut(&mut self, field: RowField) -> &mut FieldValue {
        match field {
            RowField::Picked => &mut self.picked,
            RowField::Original => &mut self.original,
            RowField::Returns => &mut self.returns,
            RowField::Price => &mut self.price,
        }
    }

    /// Returns true when any column holds an uncommitted formula.
    pub fn has_pending(&self) -> bool {
        RowField::ORDER.iter().any(|f| self.field(*f).is_pending())
    }

    /// Clamps every settled quantity into its legal range and recomputes the
    /// derived columns.
    ///
    /// Columns holding a pending formula are left alone; they count as zero
    /// toward the `returns` ceiling and the derived columns.
    pub fn normalize(&mut self) {
        clamp_settled(&mut self.picked, ceiling(self.stock));
        clamp_settled(&mut self.original, ceiling(self.original_stock));
        let returns_ceiling = self.picked.safe_num() + self.original.safe_num();
        clamp_settled(&mut self.returns, returns_ceiling);
        self.recompute();
    }

    /// Recomputes `sold` and `subtotal` from the stored columns.
    pub fn recompute(&mut self) {
        self.sold = self.picked.safe_num() + self.original.safe_num() - self.returns.safe_num();
        let subtotal = self.sold * self.price.safe_num();
        self.subtotal = if subtotal.is_finite() { subtotal } else { 0.0 };
    }
}

/// Stock ceilings below zero leave nothing to pick.
fn ceiling(stock: f64) -> f64 {
    if stock.is_finite() {
        stock.max(0.0)
    } else {
        0.0
    }
}

fn clamp_settled(value: &mut FieldValue, max: f64) {
    if let FieldValue::Numeric(v) = value {
        let clamped = v.clamp(0.0, max);
        if clamped != *v {
            debug!(from = *v, to = clamped, max, "quantity clamped");
            *v = clamped;
        }
    }
}

// =============================================================================
// Row Ledger Operations
// =============================================================================

/// Applies operator text to one column of a row.
///
/// - Pending formula text is stored verbatim; nothing else changes.
/// - Otherwise the text is coerced to a number, a price is remembered for
///   future sessions, quantities are clamped (the edited column with its
///   proposed value, the others as stored) and the derived columns are
///   recomputed.
///
/// Lowering `picked` or `original` can silently truncate a `returns` value
/// that was valid before the edit.
///
/// ## Example
/// ```rust
/// use tally_core::ports::MemoryPriceMemory;
/// use tally_core::row::{apply_edit, ProductRow, RowField};
/// use tally_core::types::CatalogProduct;
///
/// let product = CatalogProduct::new("p1", "Tea eggs", 10.0, 5.0, 12.0);
/// let row = ProductRow::from_catalog(&product, None);
/// let mut prices = MemoryPriceMemory::new();
///
/// let row = apply_edit(&row, RowField::Picked, "25", &mut prices);
/// assert_eq!(row.picked.safe_num(), 10.0); // clamped to stock
/// assert_eq!(row.subtotal, 120.0);
/// ```
pub fn apply_edit(
    row: &ProductRow,
    field: RowField,
    raw: &str,
    prices: &mut dyn PriceMemory,
) -> ProductRow {
    let mut next = row.clone();

    if is_pending_formula(raw) {
        *next.field_mut(field) = FieldValue::PendingFormula(raw.to_string());
        return next;
    }

    let value = to_safe_number(raw);
    if field == RowField::Price {
        prices.remember(&next.product_id, value);
    }
    *next.field_mut(field) = FieldValue::Numeric(value);
    next.normalize();
    next
}

/// Commits a column when its field loses focus: evaluates a formula first,
/// then applies the result like direct entry.
///
/// A formula that fails to evaluate stays pending.
pub fn commit(
    row: &ProductRow,
    field: RowField,
    raw: &str,
    prices: &mut dyn PriceMemory,
) -> ProductRow {
    apply_edit(row, field, &evaluate(raw), prices)
}

/// Overwrites quantities and price from a cloned transaction, then clamps
/// and recomputes. Price memory is not touched.
pub fn overwrite(
    row: &ProductRow,
    picked: f64,
    original: f64,
    returns: f64,
    price: f64,
) -> ProductRow {
    let mut next = row.clone();
    next.picked = FieldValue::Numeric(finite_or_zero(picked));
    next.original = FieldValue::Numeric(finite_or_zero(original));
    next.returns = FieldValue::Numeric(finite_or_zero(returns));
    next.price = FieldValue::Numeric(finite_or_zero(price));
    next.normalize();
    next
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryPriceMemory;

    fn test_row(stock: f64, original_stock: f64, price: f64) -> ProductRow {
        let product = CatalogProduct::new("p1", "Rice dumpling", stock, original_stock, price);
        ProductRow::from_catalog(&product, None)
    }

    fn assert_invariants(row: &ProductRow) {
        let picked = row.picked.safe_num();
        let original = row.original.safe_num();
        let returns = row.returns.safe_num();
        assert!(picked >= 0.0 && picked <= row.stock.max(0.0), "picked {}", picked);
        assert!(
            original >= 0.0 && original <= row.original_stock.max(0.0),
            "original {}",
            original
        );
        assert!(returns >= 0.0 && returns <= picked + original, "returns {}", returns);
        assert_eq!(row.sold, picked + original - returns);
        assert_eq!(row.subtotal, row.sold * row.price.safe_num());
    }

    #[test]
    fn test_from_catalog_prefers_remembered_price() {
        let product = CatalogProduct::new("p1", "Rice dumpling", 10.0, 4.0, 35.0);
        assert_eq!(ProductRow::from_catalog(&product, None).price, FieldValue::Numeric(35.0));
        assert_eq!(
            ProductRow::from_catalog(&product, Some(40.0)).price,
            FieldValue::Numeric(40.0)
        );
    }

    #[test]
    fn test_picked_clamped_to_stock() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 2.0);

        let row = apply_edit(&row, RowField::Picked, "14", &mut prices);
        assert_eq!(row.picked, FieldValue::Numeric(10.0));
        assert_eq!(row.sold, 10.0);
        assert_eq!(row.subtotal, 20.0);

        let row = apply_edit(&row, RowField::Picked, "-3", &mut prices);
        assert_eq!(row.picked, FieldValue::Numeric(0.0));
        assert_invariants(&row);
    }

    #[test]
    fn test_original_clamped_to_original_stock() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 2.0);

        let row = apply_edit(&row, RowField::Original, "9", &mut prices);
        assert_eq!(row.original, FieldValue::Numeric(5.0));
        assert_invariants(&row);
    }

    #[test]
    fn test_returns_clamped_to_picked_plus_original() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 2.0);
        let row = apply_edit(&row, RowField::Picked, "4", &mut prices);
        let row = apply_edit(&row, RowField::Original, "2", &mut prices);

        let row = apply_edit(&row, RowField::Returns, "9", &mut prices);
        assert_eq!(row.returns, FieldValue::Numeric(6.0));
        assert_eq!(row.sold, 0.0);
        assert_invariants(&row);
    }

    #[test]
    fn test_lowering_picked_truncates_returns() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 0.0, 1.0);
        let row = apply_edit(&row, RowField::Picked, "8", &mut prices);
        let row = apply_edit(&row, RowField::Returns, "6", &mut prices);
        assert_eq!(row.returns, FieldValue::Numeric(6.0));

        let row = apply_edit(&row, RowField::Picked, "3", &mut prices);
        assert_eq!(row.returns, FieldValue::Numeric(3.0));
        assert_eq!(row.sold, 0.0);
        assert_invariants(&row);
    }

    #[test]
    fn test_pending_formula_stored_verbatim() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let row = apply_edit(&row, RowField::Picked, "4", &mut prices);

        let pending = apply_edit(&row, RowField::Picked, "=2*", &mut prices);
        assert_eq!(pending.picked, FieldValue::PendingFormula("=2*".to_string()));
        // Derived columns untouched until commit.
        assert_eq!(pending.sold, 4.0);
        assert_eq!(pending.subtotal, 12.0);
    }

    #[test]
    fn test_pending_untouched_field_counts_as_zero() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let row = apply_edit(&row, RowField::Original, "=1+", &mut prices);

        let row = apply_edit(&row, RowField::Picked, "2", &mut prices);
        assert_eq!(row.original, FieldValue::PendingFormula("=1+".to_string()));
        assert_eq!(row.sold, 2.0);
        assert_eq!(row.subtotal, 6.0);

        let row = apply_edit(&row, RowField::Returns, "5", &mut prices);
        assert_eq!(row.returns, FieldValue::Numeric(2.0));
        assert_eq!(row.sold, 0.0);
    }

    #[test]
    fn test_commit_evaluates_then_clamps() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);

        let row = commit(&row, RowField::Picked, "=3*3", &mut prices);
        assert_eq!(row.picked, FieldValue::Numeric(9.0));

        let row = commit(&row, RowField::Picked, "=6*3", &mut prices);
        assert_eq!(row.picked, FieldValue::Numeric(10.0));
        assert_invariants(&row);
    }

    #[test]
    fn test_commit_failed_formula_stays_pending() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let row = commit(&row, RowField::Picked, "=4/0", &mut prices);

        assert_eq!(row.picked, FieldValue::PendingFormula("=4/0".to_string()));
        assert_eq!(row.sold, 0.0);
    }

    #[test]
    fn test_price_edit_is_remembered() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let row = apply_edit(&row, RowField::Picked, "2", &mut prices);

        let row = apply_edit(&row, RowField::Price, "4.5", &mut prices);
        assert_eq!(row.subtotal, 9.0);
        assert_eq!(prices.recall("p1"), Some(4.5));

        // Pending price formulas are not remembered.
        let _ = apply_edit(&row, RowField::Price, "=5+", &mut prices);
        assert_eq!(prices.recall("p1"), Some(4.5));
    }

    #[test]
    fn test_quantity_edit_does_not_touch_price_memory() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let _ = apply_edit(&row, RowField::Picked, "2", &mut prices);
        assert!(prices.is_empty());
    }

    #[test]
    fn test_garbage_input_coerces_to_zero() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let row = apply_edit(&row, RowField::Picked, "abc", &mut prices);
        assert_eq!(row.picked, FieldValue::Numeric(0.0));
        assert_invariants(&row);
    }

    #[test]
    fn test_apply_edit_is_idempotent() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let once = apply_edit(&row, RowField::Picked, "7", &mut prices);
        let twice = apply_edit(&once, RowField::Picked, "7", &mut prices);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_negative_stock_allows_nothing() {
        let mut prices = MemoryPriceMemory::new();
        let row = test_row(-2.0, 5.0, 3.0);
        let row = apply_edit(&row, RowField::Picked, "1", &mut prices);
        assert_eq!(row.picked, FieldValue::Numeric(0.0));
    }

    #[test]
    fn test_invariants_hold_over_edit_sequence() {
        let mut prices = MemoryPriceMemory::new();
        let mut row = test_row(12.0, 6.0, 2.5);
        let edits = [
            (RowField::Picked, "20"),
            (RowField::Returns, "30"),
            (RowField::Original, "4"),
            (RowField::Returns, "=5+5"),
            (RowField::Picked, "=1+1"),
            (RowField::Returns, "11"),
            (RowField::Picked, "1"),
            (RowField::Price, "x"),
            (RowField::Original, "-8"),
            (RowField::Returns, "0.5"),
        ];
        for (field, raw) in edits {
            row = commit(&row, field, raw, &mut prices);
            assert_invariants(&row);
        }
    }

    #[test]
    fn test_overwrite_clamps_without_remembering_price() {
        let prices = MemoryPriceMemory::new();
        let row = test_row(10.0, 5.0, 3.0);
        let row = overwrite(&row, 12.0, 1.0, 20.0, 8.0);

        assert_eq!(row.picked, FieldValue::Numeric(10.0));
        assert_eq!(row.returns, FieldValue::Numeric(11.0));
        assert_eq!(row.price, FieldValue::Numeric(8.0));
        assert!(prices.recall("p1").is_none());
        assert_invariants(&row);
    }
}
