//! # Merge Aggregator
//!
//! Folds several same-day sale records into one display-only manifest for
//! combined printing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  live rows:   [ Tea ]        [ Rice ]        [ Buns ]                   │
//! │                                                                         │
//! │  record A:    Tea picked 3   Rice picked 2                              │
//! │  record B:    Tea picked 0   Rice picked 5                              │
//! │  record C:                   Rice picked 1                              │
//! │                                                                         │
//! │  merged:      Tea "3"        Rice "2 / 5 / 1"  Buns ""                  │
//! │               (zeros dropped, record order kept, one row per live row)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The manifest is not a new financial computation: stock columns are
//! zeroed and the subtotal is left blank.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::amount::{format_amount, is_zero};
use crate::row::ProductRow;
use crate::types::{SaleLineItem, SaleRecord};
use crate::value::FieldValue;

/// Separator between values collected from different records.
pub const MERGE_SEPARATOR: &str = " / ";

/// One product line of a merged manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MergedLedgerRow {
    pub product_id: String,
    pub name: String,
    /// Always 0 in a manifest.
    pub stock: f64,
    /// Always 0 in a manifest.
    pub original_stock: f64,
    pub picked: String,
    pub original: String,
    pub returns: String,
    pub sold: String,
    pub price: String,
    /// Always empty in a manifest.
    pub subtotal: String,
}

impl MergedLedgerRow {
    fn blank(base: &ProductRow) -> Self {
        MergedLedgerRow {
            product_id: base.product_id.clone(),
            name: base.name.clone(),
            stock: 0.0,
            original_stock: 0.0,
            picked: String::new(),
            original: String::new(),
            returns: String::new(),
            sold: String::new(),
            price: String::new(),
            subtotal: String::new(),
        }
    }
}

/// Merges sale records into one manifest row per live row.
///
/// Output order and length follow `base_rows`, including products no record
/// touched. The unit price comes from the first record that sold the
/// product; when none did, the live row's settled price is shown. With no
/// records at all the manifest is entirely blank.
pub fn merge(base_rows: &[ProductRow], records: &[SaleRecord]) -> Vec<MergedLedgerRow> {
    base_rows
        .iter()
        .map(|base| merge_row(base, records))
        .collect()
}

fn merge_row(base: &ProductRow, records: &[SaleRecord]) -> MergedLedgerRow {
    let mut merged = MergedLedgerRow::blank(base);
    if records.is_empty() {
        return merged;
    }

    let items: Vec<&SaleLineItem> = records
        .iter()
        .flat_map(|record| record.items_for(&base.product_id))
        .collect();

    merged.picked = join_non_zero(items.iter().map(|item| item.picked));
    merged.original = join_non_zero(items.iter().map(|item| item.original));
    merged.returns = join_non_zero(items.iter().map(|item| item.returns));
    merged.sold = join_non_zero(items.iter().map(|item| item.sold));

    merged.price = match items.first() {
        Some(first) => format_amount(first.unit_price),
        None => match &base.price {
            FieldValue::Numeric(price) => format_amount(*price),
            FieldValue::PendingFormula(_) => String::new(),
        },
    };

    merged
}

fn join_non_zero(values: impl Iterator<Item = f64>) -> String {
    values
        .filter(|v| !is_zero(*v))
        .map(format_amount)
        .collect::<Vec<_>>()
        .join(MERGE_SEPARATOR)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::types::{CatalogProduct, PaymentMode};

    fn base_row(id: &str, price: f64) -> ProductRow {
        let product = CatalogProduct::new(id, id.to_uppercase(), 10.0, 5.0, price);
        ProductRow::from_catalog(&product, None)
    }

    fn item(
        product_id: &str,
        picked: f64,
        original: f64,
        returns: f64,
        unit_price: f64,
    ) -> SaleLineItem {
        SaleLineItem {
            product_id: product_id.to_string(),
            name: String::new(),
            picked,
            original,
            returns,
            sold: picked + original - returns,
            unit_price,
        }
    }

    fn record(id: &str, items: Vec<SaleLineItem>) -> SaleRecord {
        SaleRecord {
            id: id.to_string(),
            customer: "Stall 7".to_string(),
            payment_mode: PaymentMode::Cash,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            items,
            total: 0.0,
        }
    }

    #[test]
    fn test_zero_values_are_dropped() {
        let base = vec![base_row("tea", 20.0)];
        let records = vec![
            record("a", vec![item("tea", 3.0, 0.0, 0.0, 20.0)]),
            record("b", vec![item("tea", 0.0, 0.0, 0.0, 20.0)]),
        ];

        let merged = merge(&base, &records);
        assert_eq!(merged[0].picked, "3");
        assert_eq!(merged[0].original, "");
        assert_eq!(merged[0].sold, "3");
    }

    #[test]
    fn test_values_joined_in_record_order() {
        let base = vec![base_row("rice", 35.0)];
        let records = vec![
            record("a", vec![item("rice", 2.0, 1.0, 0.0, 35.0)]),
            record("b", vec![item("rice", 5.0, 0.0, 1.0, 35.0)]),
            record("c", vec![item("rice", 1.5, 0.0, 0.0, 35.0)]),
        ];

        let merged = merge(&base, &records);
        assert_eq!(merged[0].picked, "2 / 5 / 1.5");
        assert_eq!(merged[0].original, "1");
        assert_eq!(merged[0].returns, "1");
        assert_eq!(merged[0].sold, "3 / 4 / 1.5");
    }

    #[test]
    fn test_one_row_per_base_row_in_base_order() {
        let base = vec![base_row("buns", 15.0), base_row("tea", 20.0), base_row("rice", 35.0)];
        let records = vec![record(
            "a",
            vec![item("rice", 1.0, 0.0, 0.0, 35.0), item("ghost", 9.0, 0.0, 0.0, 1.0)],
        )];

        let merged = merge(&base, &records);
        let ids: Vec<&str> = merged.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["buns", "tea", "rice"]);
        assert_eq!(merged[0].picked, "");
        assert_eq!(merged[2].picked, "1");
        assert_eq!(merged[0].name, "BUNS");
    }

    #[test]
    fn test_repeated_lines_in_one_record_all_contribute() {
        let base = vec![base_row("tea", 20.0)];
        let records = vec![
            record(
                "a",
                vec![item("tea", 2.0, 0.0, 0.0, 19.0), item("tea", 3.0, 0.0, 1.0, 21.0)],
            ),
            record("b", vec![item("tea", 4.0, 0.0, 0.0, 20.0)]),
        ];

        let merged = merge(&base, &records);
        assert_eq!(merged[0].picked, "2 / 3 / 4");
        assert_eq!(merged[0].returns, "1");
        assert_eq!(merged[0].sold, "2 / 2 / 4");
        assert_eq!(merged[0].price, "19");
    }

    #[test]
    fn test_first_contributing_price_wins() {
        let base = vec![base_row("tea", 20.0)];
        let records = vec![
            record("a", vec![item("rice", 1.0, 0.0, 0.0, 35.0)]),
            record("b", vec![item("tea", 0.0, 0.0, 0.0, 18.0)]),
            record("c", vec![item("tea", 2.0, 0.0, 0.0, 22.0)]),
        ];

        let merged = merge(&base, &records);
        assert_eq!(merged[0].price, "18");
        assert_eq!(merged[0].picked, "2");
    }

    #[test]
    fn test_price_falls_back_to_live_row() {
        let base = vec![base_row("tea", 20.5)];
        let records = vec![record("a", vec![item("rice", 1.0, 0.0, 0.0, 35.0)])];

        let merged = merge(&base, &records);
        assert_eq!(merged[0].price, "20.5");
    }

    #[test]
    fn test_pending_live_price_falls_back_to_empty() {
        let mut row = base_row("tea", 20.0);
        row.price = FieldValue::PendingFormula("=20*".to_string());
        let records = vec![record("a", vec![])];

        let merged = merge(&[row], &records);
        assert_eq!(merged[0].price, "");
    }

    #[test]
    fn test_no_records_yields_blank_manifest() {
        let base = vec![base_row("tea", 20.0), base_row("rice", 35.0)];
        let merged = merge(&base, &[]);

        assert_eq!(merged.len(), 2);
        for row in &merged {
            assert_eq!(row.picked, "");
            assert_eq!(row.original, "");
            assert_eq!(row.returns, "");
            assert_eq!(row.sold, "");
            assert_eq!(row.price, "");
            assert_eq!(row.subtotal, "");
            assert_eq!(row.stock, 0.0);
            assert_eq!(row.original_stock, 0.0);
        }
    }

    #[test]
    fn test_stock_and_subtotal_suppressed() {
        let base = vec![base_row("tea", 20.0)];
        let records = vec![record("a", vec![item("tea", 4.0, 0.0, 0.0, 20.0)])];

        let merged = merge(&base, &records);
        assert_eq!(merged[0].stock, 0.0);
        assert_eq!(merged[0].original_stock, 0.0);
        assert_eq!(merged[0].subtotal, "");
    }
}
