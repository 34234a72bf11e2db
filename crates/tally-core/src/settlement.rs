//! # Settlement Calculator
//!
//! Combines row subtotals, the drawer and the expense panel into the single
//! figure the operator settles.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CREDIT                                                                 │
//! │    final_total = Σ row.subtotal                                         │
//! │                                                                         │
//! │  CASH                                                                   │
//! │    final_total = ( total_cash_net                                       │
//! │                  + expenses_plus_line_pay                               │
//! │                  + service_fee )                                        │
//! │                  − Σ row.subtotal                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The settlement is derived state: it is recomputed from the current rows,
//! drawer and expenses every time it is read and never written back.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cash::{CashDrawer, ExpenseLedger};
use crate::row::ProductRow;
use crate::types::PaymentMode;

/// Every figure shown in the settlement panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub mode: PaymentMode,
    pub total_cash: f64,
    pub total_cash_net: f64,
    pub total_row_subtotal: f64,
    pub total_expenses_plus_line_pay: f64,
    pub service_fee: f64,
    pub final_total: f64,
}

/// Sum of row subtotals.
pub fn total_row_subtotal(rows: &[ProductRow]) -> f64 {
    rows.iter().map(|row| row.subtotal).sum()
}

/// Computes the settlement for the given state.
///
/// Drawer and expense figures are always reported; under
/// [`PaymentMode::Credit`] they simply do not enter `final_total`.
///
/// ## Example
/// ```rust
/// use tally_core::cash::{CashDrawer, Denomination, ExpenseLedger};
/// use tally_core::settlement::settle;
/// use tally_core::types::PaymentMode;
///
/// let mut drawer = CashDrawer::with_reserve(1000.0);
/// drawer.commit_count(Denomination::Thousand, "3");
/// let expenses = ExpenseLedger::new();
///
/// let cash = settle(PaymentMode::Cash, &[], &drawer, &expenses);
/// assert_eq!(cash.final_total, 2000.0);
///
/// let credit = settle(PaymentMode::Credit, &[], &drawer, &expenses);
/// assert_eq!(credit.final_total, 0.0);
/// ```
pub fn settle(
    mode: PaymentMode,
    rows: &[ProductRow],
    drawer: &CashDrawer,
    expenses: &ExpenseLedger,
) -> Settlement {
    let total_cash = drawer.total_cash();
    let total_cash_net = drawer.total_cash_net();
    let total_row_subtotal = total_row_subtotal(rows);
    let total_expenses_plus_line_pay = expenses.total_expenses_plus_line_pay();
    let service_fee = expenses.service_fee();

    let final_total = match mode {
        PaymentMode::Credit => total_row_subtotal,
        PaymentMode::Cash => {
            (total_cash_net + total_expenses_plus_line_pay + service_fee) - total_row_subtotal
        }
    };

    Settlement {
        mode,
        total_cash,
        total_cash_net,
        total_row_subtotal,
        total_expenses_plus_line_pay,
        service_fee,
        final_total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cash::{Denomination, ExpenseCategory};
    use crate::ports::MemoryPriceMemory;
    use crate::row::{apply_edit, RowField};
    use crate::types::CatalogProduct;

    fn sold_row(id: &str, picked: &str, price: f64) -> ProductRow {
        let mut prices = MemoryPriceMemory::new();
        let product = CatalogProduct::new(id, id, 100.0, 0.0, price);
        let row = ProductRow::from_catalog(&product, None);
        apply_edit(&row, RowField::Picked, picked, &mut prices)
    }

    fn fixture() -> (Vec<ProductRow>, CashDrawer, ExpenseLedger) {
        let rows = vec![sold_row("a", "10", 35.0), sold_row("b", "4", 50.0)];

        let mut drawer = CashDrawer::with_reserve(2000.0);
        drawer.commit_count(Denomination::Thousand, "2");
        drawer.commit_count(Denomination::Hundred, "7");
        drawer.commit_count(Denomination::Fifty, "1");

        let mut expenses = ExpenseLedger::new();
        expenses.commit(ExpenseCategory::Stall, "300");
        expenses.commit(ExpenseCategory::Parking, "40");
        expenses.commit(ExpenseCategory::LinePay, "200");
        expenses.commit(ExpenseCategory::ServiceFee, "10");

        (rows, drawer, expenses)
    }

    #[test]
    fn test_cash_settlement() {
        let (rows, drawer, expenses) = fixture();
        let settlement = settle(PaymentMode::Cash, &rows, &drawer, &expenses);

        assert_eq!(settlement.total_cash, 2750.0);
        assert_eq!(settlement.total_cash_net, 750.0);
        assert_eq!(settlement.total_row_subtotal, 550.0);
        assert_eq!(settlement.total_expenses_plus_line_pay, 540.0);
        assert_eq!(settlement.service_fee, 10.0);
        // (750 + 540 + 10) - 550
        assert_eq!(settlement.final_total, 750.0);
    }

    #[test]
    fn test_credit_settlement_ignores_drawer() {
        let (rows, drawer, expenses) = fixture();
        let settlement = settle(PaymentMode::Credit, &rows, &drawer, &expenses);

        assert_eq!(settlement.final_total, 550.0);
        assert_eq!(settlement.total_cash, 2750.0);
    }

    #[test]
    fn test_mode_switch_does_not_mutate_inputs() {
        let (rows, drawer, expenses) = fixture();
        let before = (rows.clone(), drawer.clone(), expenses.clone());

        let cash = settle(PaymentMode::Cash, &rows, &drawer, &expenses);
        let credit = settle(PaymentMode::Credit, &rows, &drawer, &expenses);

        assert_ne!(cash.final_total, credit.final_total);
        assert_eq!((rows, drawer, expenses), before);
    }

    #[test]
    fn test_pending_values_read_as_zero() {
        let (mut rows, mut drawer, mut expenses) = fixture();
        let mut prices = MemoryPriceMemory::new();
        rows[1] = apply_edit(&rows[1], RowField::Price, "=50*", &mut prices);
        drawer.edit_reserve("=1000+");
        expenses.edit(ExpenseCategory::Stall, "=300-");

        let settlement = settle(PaymentMode::Cash, &rows, &drawer, &expenses);
        // Row b's subtotal is untouched until its price commits.
        assert_eq!(settlement.total_row_subtotal, 550.0);
        assert_eq!(settlement.total_cash_net, 2750.0);
        assert_eq!(settlement.total_expenses_plus_line_pay, 240.0);
    }

    #[test]
    fn test_empty_state_settles_to_zero() {
        let settlement = settle(
            PaymentMode::Cash,
            &[],
            &CashDrawer::default(),
            &ExpenseLedger::new(),
        );
        assert_eq!(settlement.final_total, 0.0);
    }
}
