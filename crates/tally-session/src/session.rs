//! # Entry Session
//!
//! One operator's in-progress ledger form, from catalog load to a successful
//! save and reset.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Entry Session Lifecycle                           │
//! │                                                                         │
//! │  load() ──► fetch catalog ──► validate, sort by weight ──► build rows   │
//! │                                   │                                     │
//! │                                   └──► clone slot? overwrite rows once  │
//! │                                                                         │
//! │  edit_*() / commit_*() ──► RowLedger / CashDrawer / ExpenseLedger       │
//! │                                                                         │
//! │  settlement() ──► derived, recomputed on every read                     │
//! │                                                                         │
//! │  submit() ──► validate ──► SaleSink ──┬── Ok  ──► reset to fresh form   │
//! │                                       └── Err ──► state unchanged       │
//! │                                                                         │
//! │  print() ─────────────────────────────────────► PrintService            │
//! │  print_merged(ids) ──► SaleHistory ──► merge ──► PrintService           │
//! │                    (never mutates the session)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is owned by a single task. Collaborator calls are awaited one
//! at a time and every mutation takes `&mut self`, so no locking is needed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::amount::{format_amount, round_to_cents};
use tally_core::focus::{route, FocusTarget, GridShape, NavKey};
use tally_core::merge::{merge, MergedLedgerRow};
use tally_core::row::{self, ProductRow, RowField};
use tally_core::settlement::{settle, Settlement};
use tally_core::validation::{validate_catalog_product, validate_customer, validate_template_id};
use tally_core::{
    CashDrawer, CatalogProduct, CloneSlot, ClonedTransaction, CoreError, Denomination,
    ExpenseCategory, ExpenseLedger, PaymentMode, PriceMemory, SaleRecord,
};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::ports::{PrintService, ProductCatalog, RenderedDocument, SaleHistory, SaleSink};

// =============================================================================
// Payloads
// =============================================================================

/// One row of a submitted sale. Pending formulas are sent as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRow {
    pub product_id: String,
    pub name: String,
    pub picked: f64,
    pub original: f64,
    pub returns: f64,
    pub sold: f64,
    pub price: f64,
    pub subtotal: f64,
}

impl SaleRow {
    fn from_row(row: &ProductRow) -> Self {
        SaleRow {
            product_id: row.product_id.clone(),
            name: row.name.clone(),
            picked: row.picked.safe_num(),
            original: row.original.safe_num(),
            returns: row.returns.safe_num(),
            sold: row.sold,
            price: row.price.safe_num(),
            subtotal: row.subtotal,
        }
    }
}

/// Everything the backend stores for a completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    /// Client-generated reference, unique per submit attempt.
    #[ts(as = "String")]
    pub client_ref: Uuid,
    pub customer: String,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub rows: Vec<SaleRow>,
    pub reserve: f64,
    pub cash_counts: BTreeMap<Denomination, f64>,
    pub expenses: BTreeMap<ExpenseCategory, f64>,
    pub settlement: Settlement,
}

/// One printed line. Every column is already display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PrintRow {
    pub name: String,
    pub stock: String,
    pub picked: String,
    pub original: String,
    pub returns: String,
    pub sold: String,
    pub price: String,
    pub subtotal: String,
}

impl PrintRow {
    fn from_live(row: &ProductRow) -> Self {
        PrintRow {
            name: row.name.clone(),
            stock: format_amount(row.stock),
            picked: format_amount(row.picked.safe_num()),
            original: format_amount(row.original.safe_num()),
            returns: format_amount(row.returns.safe_num()),
            sold: format_amount(row.sold),
            price: format_amount(row.price.safe_num()),
            subtotal: format_amount(round_to_cents(row.subtotal)),
        }
    }

    /// Stock is suppressed on a merged manifest.
    fn from_merged(row: MergedLedgerRow) -> Self {
        PrintRow {
            name: row.name,
            stock: String::new(),
            picked: row.picked,
            original: row.original,
            returns: row.returns,
            sold: row.sold,
            price: row.price,
            subtotal: row.subtotal,
        }
    }
}

/// Input to the print service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PrintPayload {
    pub template_id: String,
    pub rows: Vec<PrintRow>,
}

// =============================================================================
// Session State
// =============================================================================

/// The mutable part of a session, as the frontend renders it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub customer: String,
    pub payment_mode: PaymentMode,
    pub rows: Vec<ProductRow>,
    pub drawer: CashDrawer,
    pub expenses: ExpenseLedger,
}

/// The remote services a session works against.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn ProductCatalog>,
    pub history: Arc<dyn SaleHistory>,
    pub sink: Arc<dyn SaleSink>,
    pub printer: Arc<dyn PrintService>,
}

// =============================================================================
// Entry Session
// =============================================================================

/// One ledger entry session.
pub struct EntrySession {
    config: SessionConfig,
    collaborators: Collaborators,
    prices: Box<dyn PriceMemory + Send + Sync>,
    /// Validated catalog in display order, kept for resets.
    catalog: Vec<CatalogProduct>,
    state: SessionState,
}

impl EntrySession {
    /// Creates an empty session. Call [`EntrySession::load`] before use.
    pub fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        prices: Box<dyn PriceMemory + Send + Sync>,
    ) -> Self {
        let state = Self::fresh_state(&config, &[], prices.as_ref());
        EntrySession {
            config,
            collaborators,
            prices,
            catalog: Vec::new(),
            state,
        }
    }

    fn fresh_state(
        config: &SessionConfig,
        catalog: &[CatalogProduct],
        prices: &(dyn PriceMemory + Send + Sync),
    ) -> SessionState {
        SessionState {
            customer: String::new(),
            payment_mode: config.session.default_mode,
            rows: catalog
                .iter()
                .map(|product| ProductRow::from_catalog(product, prices.recall(&product.id)))
                .collect(),
            drawer: CashDrawer::with_reserve(config.session.default_reserve),
            expenses: ExpenseLedger::new(),
        }
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Fetches the catalog and materializes a fresh form.
    ///
    /// Products failing validation are skipped. Rows are ordered by
    /// ascending sort weight; ties keep catalog order. A pending clone
    /// transfer is consumed and overwrites the fresh form.
    ///
    /// ## Errors
    /// `SessionError::Backend` if the catalog cannot be fetched. The session
    /// and the clone slot are left untouched.
    pub async fn load(&mut self, clone_slot: &mut (dyn CloneSlot + Send)) -> SessionResult<()> {
        let products = self
            .collaborators
            .catalog
            .fetch_products()
            .await
            .map_err(|e| SessionError::backend("fetch_products", e))?;

        let fetched = products.len();
        let mut catalog: Vec<CatalogProduct> = products
            .into_iter()
            .filter(|product| match validate_catalog_product(product) {
                Ok(()) => true,
                Err(e) => {
                    warn!(product_id = %product.id, "Skipping catalog product: {}", e);
                    false
                }
            })
            .collect();
        catalog.sort_by_key(|product| product.sort_weight);

        let mut state = Self::fresh_state(&self.config, &catalog, self.prices.as_ref());
        if let Some(transfer) = clone_slot.take() {
            info!(rows = transfer.rows.len(), "Applying cloned transaction");
            apply_clone(&mut state, transfer);
        }

        info!(fetched, rows = state.rows.len(), "Entry session loaded");
        self.catalog = catalog;
        self.state = state;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn rows(&self) -> &[ProductRow] {
        &self.state.rows
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The row for a product.
    pub fn row(&self, product_id: &str) -> SessionResult<&ProductRow> {
        self.state
            .rows
            .iter()
            .find(|row| row.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    fn row_index(&self, product_id: &str) -> SessionResult<usize> {
        self.state
            .rows
            .iter()
            .position(|row| row.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    // =========================================================================
    // Row Edits
    // =========================================================================

    /// Applies a keystroke to a row column.
    pub fn edit_row(
        &mut self,
        product_id: &str,
        field: RowField,
        raw: &str,
    ) -> SessionResult<&ProductRow> {
        let index = self.row_index(product_id)?;
        let next = row::apply_edit(&self.state.rows[index], field, raw, self.prices.as_mut());
        self.state.rows[index] = next;
        Ok(&self.state.rows[index])
    }

    /// Commits a row column when it loses focus.
    pub fn commit_row(
        &mut self,
        product_id: &str,
        field: RowField,
        raw: &str,
    ) -> SessionResult<&ProductRow> {
        let index = self.row_index(product_id)?;
        let next = row::commit(&self.state.rows[index], field, raw, self.prices.as_mut());
        self.state.rows[index] = next;
        Ok(&self.state.rows[index])
    }

    /// Moves a row to a new display position. Positions past the end move
    /// the row last.
    pub fn move_row(&mut self, product_id: &str, to: usize) -> SessionResult<()> {
        let from = self.row_index(product_id)?;
        let row = self.state.rows.remove(from);
        let to = to.min(self.state.rows.len());
        self.state.rows.insert(to, row);
        debug!(product_id, from, to, "Row moved");
        Ok(())
    }

    // =========================================================================
    // Drawer & Expenses
    // =========================================================================

    fn ensure_drawer_editable(&self) -> SessionResult<()> {
        if self.state.payment_mode.uses_drawer() {
            Ok(())
        } else {
            Err(SessionError::DrawerLocked)
        }
    }

    pub fn edit_cash(&mut self, denomination: Denomination, raw: &str) -> SessionResult<()> {
        self.ensure_drawer_editable()?;
        self.state.drawer.edit_count(denomination, raw);
        Ok(())
    }

    pub fn commit_cash(&mut self, denomination: Denomination, raw: &str) -> SessionResult<()> {
        self.ensure_drawer_editable()?;
        self.state.drawer.commit_count(denomination, raw);
        Ok(())
    }

    pub fn edit_reserve(&mut self, raw: &str) -> SessionResult<()> {
        self.ensure_drawer_editable()?;
        self.state.drawer.edit_reserve(raw);
        Ok(())
    }

    pub fn commit_reserve(&mut self, raw: &str) -> SessionResult<()> {
        self.ensure_drawer_editable()?;
        self.state.drawer.commit_reserve(raw);
        Ok(())
    }

    pub fn edit_expense(&mut self, category: ExpenseCategory, raw: &str) -> SessionResult<()> {
        self.ensure_drawer_editable()?;
        self.state.expenses.edit(category, raw);
        Ok(())
    }

    pub fn commit_expense(&mut self, category: ExpenseCategory, raw: &str) -> SessionResult<()> {
        self.ensure_drawer_editable()?;
        self.state.expenses.commit(category, raw);
        Ok(())
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Sets the customer label. Validated on submit, not while typing.
    pub fn set_customer(&mut self, customer: impl Into<String>) {
        self.state.customer = customer.into();
    }

    /// Switches the payment mode. Drawer and expense values are kept.
    pub fn set_payment_mode(&mut self, mode: PaymentMode) {
        if self.state.payment_mode != mode {
            debug!(from = %self.state.payment_mode, to = %mode, "Payment mode changed");
            self.state.payment_mode = mode;
        }
    }

    // =========================================================================
    // Derived
    // =========================================================================

    /// The settlement for the current state.
    pub fn settlement(&self) -> Settlement {
        settle(
            self.state.payment_mode,
            &self.state.rows,
            &self.state.drawer,
            &self.state.expenses,
        )
    }

    /// The current grid shape.
    pub fn grid_shape(&self) -> GridShape {
        GridShape::new(self.state.rows.len())
    }

    /// Where focus goes from `current` on `key`.
    pub fn route_focus(&self, current: FocusTarget, key: NavKey) -> Option<FocusTarget> {
        route(current, key, self.grid_shape())
    }

    // =========================================================================
    // Submit
    // =========================================================================

    /// Builds the sale payload for the current state.
    ///
    /// ## Errors
    /// Validation error if the customer label is missing or too long.
    pub fn sale_payload(&self) -> SessionResult<SalePayload> {
        let customer = validate_customer(&self.state.customer)?;
        let drawer = &self.state.drawer;
        let expenses = &self.state.expenses;

        Ok(SalePayload {
            client_ref: Uuid::new_v4(),
            customer,
            payment_mode: self.state.payment_mode,
            created_at: Utc::now(),
            rows: self.state.rows.iter().map(SaleRow::from_row).collect(),
            reserve: drawer.reserve.safe_num(),
            cash_counts: Denomination::ALL
                .iter()
                .map(|d| (*d, drawer.count(*d).safe_num()))
                .collect(),
            expenses: ExpenseCategory::ALL
                .iter()
                .map(|c| (*c, expenses.amount(*c).safe_num()))
                .collect(),
            settlement: self.settlement(),
        })
    }

    /// Submits the sale and resets the form on success.
    ///
    /// ## Errors
    /// - Validation error (nothing is sent)
    /// - `SessionError::Backend` if the sink rejects the sale
    ///
    /// In both cases the session is unchanged.
    pub async fn submit(&mut self) -> SessionResult<SalePayload> {
        let payload = self.sale_payload()?;

        self.collaborators
            .sink
            .submit_sale(&payload)
            .await
            .map_err(|e| SessionError::backend("submit_sale", e))?;

        info!(
            client_ref = %payload.client_ref,
            mode = %payload.payment_mode,
            final_total = payload.settlement.final_total,
            "Sale submitted"
        );

        self.reset();
        Ok(payload)
    }

    /// Replaces the form with a fresh one built from the loaded catalog.
    pub fn reset(&mut self) {
        self.state = Self::fresh_state(&self.config, &self.catalog, self.prices.as_ref());
        debug!(rows = self.state.rows.len(), "Entry session reset");
    }

    // =========================================================================
    // Print
    // =========================================================================

    /// Fetches today's submitted sales.
    pub async fn fetch_today_records(&self) -> SessionResult<Vec<SaleRecord>> {
        self.collaborators
            .history
            .today_records()
            .await
            .map_err(|e| SessionError::backend("today_records", e))
    }

    /// Print payload for the live form.
    pub fn print_payload(&self) -> SessionResult<PrintPayload> {
        let template_id = self.config.template_for(false).to_string();
        validate_template_id(&template_id)?;

        Ok(PrintPayload {
            template_id,
            rows: self.state.rows.iter().map(PrintRow::from_live).collect(),
        })
    }

    /// Print payload merging the given records over the live rows.
    pub fn merged_print_payload(&self, records: &[SaleRecord]) -> SessionResult<PrintPayload> {
        let template_id = self.config.template_for(true).to_string();
        validate_template_id(&template_id)?;

        Ok(PrintPayload {
            template_id,
            rows: merge(&self.state.rows, records)
                .into_iter()
                .map(PrintRow::from_merged)
                .collect(),
        })
    }

    /// Renders the live form.
    pub async fn print(&self) -> SessionResult<RenderedDocument> {
        let payload = self.print_payload()?;
        self.render(payload).await
    }

    /// Renders a manifest merging the selected sales from today's history.
    ///
    /// Records keep their history order whatever the order of `record_ids`.
    /// Unknown ids are ignored; an empty selection renders a blank manifest.
    pub async fn print_merged(&self, record_ids: &[String]) -> SessionResult<RenderedDocument> {
        let records: Vec<SaleRecord> = self
            .fetch_today_records()
            .await?
            .into_iter()
            .filter(|record| record_ids.contains(&record.id))
            .collect();

        info!(
            selected = record_ids.len(),
            records = records.len(),
            "Merging sale records for print"
        );
        let payload = self.merged_print_payload(&records)?;
        self.render(payload).await
    }

    async fn render(&self, payload: PrintPayload) -> SessionResult<RenderedDocument> {
        let document = self
            .collaborators
            .printer
            .render(&payload)
            .await
            .map_err(|e| SessionError::backend("render", e))?;

        info!(
            template = %payload.template_id,
            bytes = document.len(),
            "Ledger rendered"
        );
        Ok(document)
    }
}

/// Overwrites a fresh form with a cloned transaction. Rows are matched by
/// product id; cloned rows for products no longer in the catalog are
/// dropped.
fn apply_clone(state: &mut SessionState, transfer: ClonedTransaction) {
    state.customer = transfer.customer;
    state.payment_mode = transfer.payment_mode;
    state.drawer = transfer.drawer;
    state.expenses = transfer.expenses;

    for cloned in transfer.rows {
        match state
            .rows
            .iter_mut()
            .find(|row| row.product_id == cloned.product_id)
        {
            Some(row) => {
                *row = row::overwrite(
                    row,
                    cloned.picked,
                    cloned.original,
                    cloned.returns,
                    cloned.price,
                );
            }
            None => warn!(product_id = %cloned.product_id, "Cloned row has no catalog product"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
