//! # Cash Reconciliation
//!
//! The drawer side of the entry form: denomination counts, the reserve held
//! back from the drawer, and the itemized expense panel.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_cash     = Σ denomination × safe_num(count)                      │
//! │  total_cash_net = total_cash − safe_num(reserve)                        │
//! │                                                                         │
//! │  expenses_plus_line_pay = stall + cleaning + electricity + gas          │
//! │                         + parking + goods + bags + others + line_pay    │
//! │  service_fee            = kept apart, applied by the settlement         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Counts, the reserve and expense amounts are [`FieldValue`]s, so an
//! operator can type `=12+8` into the 100 box and the totals keep working
//! (the pending formula reads as zero) until the field is committed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::formula::evaluate;
use crate::value::FieldValue;

// =============================================================================
// Denomination
// =============================================================================

/// A currency unit counted in the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Denomination {
    #[serde(rename = "1000")]
    Thousand,
    #[serde(rename = "500")]
    FiveHundred,
    #[serde(rename = "100")]
    Hundred,
    #[serde(rename = "50")]
    Fifty,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "1")]
    One,
}

impl Denomination {
    /// Every denomination, largest first (drawer panel order).
    pub const ALL: [Denomination; 7] = [
        Denomination::Thousand,
        Denomination::FiveHundred,
        Denomination::Hundred,
        Denomination::Fifty,
        Denomination::Ten,
        Denomination::Five,
        Denomination::One,
    ];

    /// Face value in currency units.
    pub const fn value(&self) -> f64 {
        match self {
            Denomination::Thousand => 1000.0,
            Denomination::FiveHundred => 500.0,
            Denomination::Hundred => 100.0,
            Denomination::Fifty => 50.0,
            Denomination::Ten => 10.0,
            Denomination::Five => 5.0,
            Denomination::One => 1.0,
        }
    }
}

// =============================================================================
// Expense Category
// =============================================================================

/// A line of the expense panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseCategory {
    Stall,
    Cleaning,
    Electricity,
    Gas,
    Parking,
    Goods,
    Bags,
    Others,
    /// Money received through LINE Pay; offsets the drawer like an expense.
    LinePay,
    /// Card/platform service fee; applied on its own by the settlement.
    ServiceFee,
}

impl ExpenseCategory {
    /// Every category in panel order.
    pub const ALL: [ExpenseCategory; 10] = [
        ExpenseCategory::Stall,
        ExpenseCategory::Cleaning,
        ExpenseCategory::Electricity,
        ExpenseCategory::Gas,
        ExpenseCategory::Parking,
        ExpenseCategory::Goods,
        ExpenseCategory::Bags,
        ExpenseCategory::Others,
        ExpenseCategory::LinePay,
        ExpenseCategory::ServiceFee,
    ];

    /// True for the categories summed into `expenses_plus_line_pay`.
    pub const fn counts_toward_expenses(&self) -> bool {
        !matches!(self, ExpenseCategory::ServiceFee)
    }
}

// =============================================================================
// Cash Drawer
// =============================================================================

/// Denomination counts plus the reserve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashDrawer {
    /// Count per denomination; a missing entry counts as zero.
    #[serde(default)]
    pub counts: BTreeMap<Denomination, FieldValue>,

    /// Amount held back from the drawer total.
    #[serde(default)]
    pub reserve: FieldValue,
}

impl CashDrawer {
    /// Creates an empty drawer with the given reserve.
    pub fn with_reserve(reserve: f64) -> Self {
        CashDrawer {
            counts: BTreeMap::new(),
            reserve: FieldValue::Numeric(reserve),
        }
    }

    /// The stored count for a denomination.
    pub fn count(&self, denomination: Denomination) -> FieldValue {
        self.counts.get(&denomination).cloned().unwrap_or_default()
    }

    /// Stores operator text for a count while typing.
    pub fn edit_count(&mut self, denomination: Denomination, raw: &str) {
        self.counts.insert(denomination, FieldValue::from_input(raw));
    }

    /// Evaluates and stores a count when its field loses focus.
    pub fn commit_count(&mut self, denomination: Denomination, raw: &str) {
        self.counts.insert(denomination, FieldValue::from_input(&evaluate(raw)));
    }

    /// Stores operator text for the reserve while typing.
    pub fn edit_reserve(&mut self, raw: &str) {
        self.reserve = FieldValue::from_input(raw);
    }

    /// Evaluates and stores the reserve when its field loses focus.
    pub fn commit_reserve(&mut self, raw: &str) {
        self.reserve = FieldValue::from_input(&evaluate(raw));
    }

    /// `Σ denomination × safe_num(count)`.
    pub fn total_cash(&self) -> f64 {
        Denomination::ALL
            .iter()
            .map(|d| d.value() * self.count(*d).safe_num())
            .sum()
    }

    /// Drawer total minus the reserve.
    pub fn total_cash_net(&self) -> f64 {
        self.total_cash() - self.reserve.safe_num()
    }
}

// =============================================================================
// Expense Ledger
// =============================================================================

/// Amounts per expense category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseLedger {
    #[serde(default)]
    pub amounts: BTreeMap<ExpenseCategory, FieldValue>,
}

impl ExpenseLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored amount for a category.
    pub fn amount(&self, category: ExpenseCategory) -> FieldValue {
        self.amounts.get(&category).cloned().unwrap_or_default()
    }

    /// Stores operator text while typing.
    pub fn edit(&mut self, category: ExpenseCategory, raw: &str) {
        self.amounts.insert(category, FieldValue::from_input(raw));
    }

    /// Evaluates and stores an amount when its field loses focus.
    pub fn commit(&mut self, category: ExpenseCategory, raw: &str) {
        self.amounts.insert(category, FieldValue::from_input(&evaluate(raw)));
    }

    /// Every category except the service fee, line pay included.
    pub fn total_expenses_plus_line_pay(&self) -> f64 {
        ExpenseCategory::ALL
            .iter()
            .filter(|c| c.counts_toward_expenses())
            .map(|c| self.amount(*c).safe_num())
            .sum()
    }

    /// The service fee on its own.
    pub fn service_fee(&self) -> f64 {
        self.amount(ExpenseCategory::ServiceFee).safe_num()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_cash() {
        let mut drawer = CashDrawer::default();
        drawer.commit_count(Denomination::Thousand, "2");
        drawer.commit_count(Denomination::Hundred, "3");
        drawer.commit_count(Denomination::One, "7");

        assert_eq!(drawer.total_cash(), 2307.0);
    }

    #[test]
    fn test_total_cash_net_subtracts_reserve() {
        let mut drawer = CashDrawer::with_reserve(500.0);
        drawer.commit_count(Denomination::FiveHundred, "4");

        assert_eq!(drawer.total_cash(), 2000.0);
        assert_eq!(drawer.total_cash_net(), 1500.0);
    }

    #[test]
    fn test_pending_count_reads_as_zero() {
        let mut drawer = CashDrawer::default();
        drawer.commit_count(Denomination::Ten, "5");
        drawer.edit_count(Denomination::Hundred, "=3+");

        assert!(drawer.count(Denomination::Hundred).is_pending());
        assert_eq!(drawer.total_cash(), 50.0);

        drawer.commit_count(Denomination::Hundred, "=3+4");
        assert_eq!(drawer.count(Denomination::Hundred), FieldValue::Numeric(7.0));
        assert_eq!(drawer.total_cash(), 750.0);
    }

    #[test]
    fn test_failed_formula_commit_stays_pending() {
        let mut drawer = CashDrawer::default();
        drawer.commit_reserve("=100/0");

        assert_eq!(drawer.reserve, FieldValue::PendingFormula("=100/0".to_string()));
        assert_eq!(drawer.total_cash_net(), 0.0);
    }

    #[test]
    fn test_expenses_exclude_service_fee() {
        let mut expenses = ExpenseLedger::new();
        expenses.commit(ExpenseCategory::Stall, "300");
        expenses.commit(ExpenseCategory::Gas, "=40+10");
        expenses.commit(ExpenseCategory::LinePay, "120");
        expenses.commit(ExpenseCategory::ServiceFee, "15");

        assert_eq!(expenses.total_expenses_plus_line_pay(), 470.0);
        assert_eq!(expenses.service_fee(), 15.0);
    }

    #[test]
    fn test_denomination_serde_keys() {
        let mut drawer = CashDrawer::default();
        drawer.commit_count(Denomination::Fifty, "2");
        let json = serde_json::to_value(&drawer).unwrap();
        assert_eq!(json["counts"]["50"], serde_json::json!(2.0));
    }

    #[test]
    fn test_expense_serde_names() {
        let json = serde_json::to_string(&ExpenseCategory::LinePay).unwrap();
        assert_eq!(json, "\"linePay\"");
        let back: ExpenseCategory = serde_json::from_str("\"serviceFee\"").unwrap();
        assert_eq!(back, ExpenseCategory::ServiceFee);
    }
}
