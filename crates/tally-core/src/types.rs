//! # Domain Types
//!
//! Data exchanged between the ledger and its collaborators.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │ CatalogProduct  │   │   SaleRecord    │   │  ClonedTransaction   │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  id, name       │   │  id, customer   │   │  customer, mode      │  │
//! │  │  stock          │   │  mode, time     │   │  drawer, expenses    │  │
//! │  │  original_stock │   │  items[]        │   │  rows[]              │  │
//! │  │  price, weight  │   │  total          │   │                      │  │
//! │  └───────┬─────────┘   └───────┬─────────┘   └──────────┬───────────┘  │
//! │          │ load                │ merge                  │ load (once)  │
//! │          ▼                     ▼                        ▼              │
//! │      ProductRow          MergedLedgerRow           ProductRow          │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  PaymentMode    │  Cash: drawer + expenses settle the transaction   │
//! │  │  Cash | Credit  │  Credit: invoice value alone                      │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cash::{CashDrawer, ExpenseLedger};
use crate::error::ValidationError;
use crate::value::lenient_number;

// =============================================================================
// Payment Mode
// =============================================================================

/// How the transaction is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Settled against the counted drawer.
    #[default]
    #[serde(alias = "cash")]
    Cash,
    /// Settled by invoice value; drawer and expenses are informational.
    #[serde(alias = "credit", alias = "card")]
    Credit,
}

impl PaymentMode {
    /// Returns true when the drawer and expense panel take part in the
    /// settlement and may be edited.
    pub fn uses_drawer(&self) -> bool {
        matches!(self, PaymentMode::Cash)
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMode::Cash => write!(f, "cash"),
            PaymentMode::Credit => write!(f, "credit"),
        }
    }
}

impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "credit" | "card" => Ok(PaymentMode::Credit),
            other => Err(ValidationError::InvalidFormat {
                field: "payment_mode".to_string(),
                reason: format!("unknown mode '{}', expected cash or credit", other),
            }),
        }
    }
}

// =============================================================================
// Catalog Product
// =============================================================================

/// A product as delivered by the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    /// New stock available to pick.
    #[serde(deserialize_with = "lenient_number", default)]
    pub stock: f64,
    /// Returned/original stock available.
    #[serde(deserialize_with = "lenient_number", default)]
    pub original_stock: f64,
    /// Catalog list price.
    #[serde(deserialize_with = "lenient_number", default)]
    pub price: f64,
    /// Display ordering key; lower sorts first.
    #[serde(default)]
    pub sort_weight: i64,
}

impl CatalogProduct {
    /// Creates a catalog product with sort weight 0.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stock: f64,
        original_stock: f64,
        price: f64,
    ) -> Self {
        CatalogProduct {
            id: id.into(),
            name: name.into(),
            stock,
            original_stock,
            price,
            sort_weight: 0,
        }
    }

    /// Sets the sort weight.
    pub fn with_sort_weight(mut self, sort_weight: i64) -> Self {
        self.sort_weight = sort_weight;
        self
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// One line of a historical sale.
///
/// Quantities may arrive as numbers or strings; anything unreadable is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "lenient_number", default)]
    pub picked: f64,
    #[serde(deserialize_with = "lenient_number", default)]
    pub original: f64,
    #[serde(deserialize_with = "lenient_number", default)]
    pub returns: f64,
    #[serde(deserialize_with = "lenient_number", default)]
    pub sold: f64,
    #[serde(deserialize_with = "lenient_number", default)]
    pub unit_price: f64,
}

/// A sale submitted earlier, read back for merged printing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    #[serde(default)]
    pub customer: String,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<SaleLineItem>,
    #[serde(deserialize_with = "lenient_number", default)]
    pub total: f64,
}

impl SaleRecord {
    /// Every line for a product, in line order.
    ///
    /// A record may carry several lines for the same product when it was
    /// entered in parts.
    pub fn items_for<'a>(
        &'a self,
        product_id: &'a str,
    ) -> impl Iterator<Item = &'a SaleLineItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.product_id == product_id)
    }
}

// =============================================================================
// Cloned Transaction
// =============================================================================

/// Per-product values carried by a cloned transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClonedRow {
    pub product_id: String,
    #[serde(deserialize_with = "lenient_number", default)]
    pub picked: f64,
    #[serde(deserialize_with = "lenient_number", default)]
    pub original: f64,
    #[serde(deserialize_with = "lenient_number", default)]
    pub returns: f64,
    #[serde(deserialize_with = "lenient_number", default)]
    pub price: f64,
}

/// A previous transaction copied into a fresh session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClonedTransaction {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub drawer: CashDrawer,
    #[serde(default)]
    pub expenses: ExpenseLedger,
    #[serde(default)]
    pub rows: Vec<ClonedRow>,
}

// =============================================================================
// Unit Tests
// =============================================================================
