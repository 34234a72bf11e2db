//! # tally-core: Pure Ledger Logic for Tally POS
//!
//! The computation and interaction engine behind the ledger entry form.
//! Every function here is deterministic and free of I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Entry form (frontend)                        │   │
//! │  │    Product grid ──► Drawer panel ──► Expenses ──► Print         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-session (EntrySession)                    │   │
//! │  │    load, edit/commit, settle, submit, print                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │ formula │ │   row   │ │cash/settle│ │  merge  │ │ focus  │  │   │
//! │  │   │ =2+2*3  │ │ clamping│ │ drawer   │ │ A / B   │ │ routes │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`value`] - `FieldValue`: settled number or pending formula
//! - [`amount`] - cent rounding and minimal display form
//! - [`formula`] - the `=`-prefixed arithmetic micro-language
//! - [`row`] - product rows, clamping and recompute
//! - [`cash`] - drawer counts, reserve and expenses
//! - [`settlement`] - final settlement per payment mode
//! - [`merge`] - combined manifest of same-day sale records
//! - [`focus`] - keyboard focus routing
//! - [`ports`] - price memory and clone slot interfaces
//! - [`types`] - catalog, sale record and clone transfer types
//! - [`validation`] - payload and catalog validation
//! - [`error`] - domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::formula::evaluate;
//! use tally_core::ports::MemoryPriceMemory;
//! use tally_core::row::{commit, ProductRow, RowField};
//! use tally_core::types::CatalogProduct;
//!
//! let product = CatalogProduct::new("egg", "Tea eggs", 40.0, 0.0, 12.0);
//! let mut prices = MemoryPriceMemory::new();
//! let row = ProductRow::from_catalog(&product, None);
//!
//! // The operator types "=12*3" into the picked box and tabs away.
//! let row = commit(&row, RowField::Picked, "=12*3", &mut prices);
//! assert_eq!(row.sold, 36.0);
//! assert_eq!(row.subtotal, 432.0);
//! assert_eq!(evaluate("=7/2"), "3.5");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod amount;
pub mod cash;
pub mod error;
pub mod focus;
pub mod formula;
pub mod merge;
pub mod ports;
pub mod row;
pub mod settlement;
pub mod types;
pub mod validation;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cash::{CashDrawer, Denomination, ExpenseCategory, ExpenseLedger};
pub use error::{CoreError, CoreResult, ValidationError};
pub use focus::{FocusTarget, GridShape, NavKey, SidebarField};
pub use merge::MergedLedgerRow;
pub use ports::{CloneSlot, MemoryCloneSlot, MemoryPriceMemory, PriceMemory};
pub use row::{ProductRow, RowField};
pub use settlement::Settlement;
pub use types::*;
pub use value::FieldValue;
