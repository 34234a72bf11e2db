//! # Storage Ports
//!
//! Narrow interfaces to the two side-channel stores the ledger touches:
//!
//! - [`PriceMemory`] - per-product last-entered price, read when rows are
//!   built and written by price edits
//! - [`CloneSlot`] - one-shot transfer of a previously cloned transaction,
//!   consumed once at load time
//!
//! Durable implementations live outside this crate. The in-memory ones
//! here back tests and sessions that do not need persistence.

use std::collections::HashMap;

use crate::types::ClonedTransaction;

// =============================================================================
// Price Memory
// =============================================================================

/// Per-product remembered price.
///
/// Writes are fire-and-forget: an implementation that fails to persist must
/// log and carry on, never block or fail the edit that triggered it.
pub trait PriceMemory {
    /// Returns the last price remembered for the product, if any.
    fn recall(&self, product_id: &str) -> Option<f64>;

    /// Remembers the price for future sessions.
    fn remember(&mut self, product_id: &str, price: f64);
}

/// Price memory held in a plain map.
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceMemory {
    prices: HashMap<String, f64>,
}

impl MemoryPriceMemory {
    /// Creates an empty price memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of remembered products.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Returns true when nothing has been remembered.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceMemory for MemoryPriceMemory {
    fn recall(&self, product_id: &str) -> Option<f64> {
        self.prices.get(product_id).copied()
    }

    fn remember(&mut self, product_id: &str, price: f64) {
        self.prices.insert(product_id.to_string(), price);
    }
}

// =============================================================================
// Clone Slot
// =============================================================================

/// One-shot slot carrying a cloned transaction into the next session.
pub trait CloneSlot {
    /// Removes and returns the pending transfer. Subsequent calls return
    /// `None` until something new is placed in the slot.
    fn take(&mut self) -> Option<ClonedTransaction>;
}

/// Clone slot held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCloneSlot {
    pending: Option<ClonedTransaction>,
}

impl MemoryCloneSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a transaction in the slot, replacing any unconsumed one.
    pub fn put(&mut self, transaction: ClonedTransaction) {
        self.pending = Some(transaction);
    }
}

impl CloneSlot for MemoryCloneSlot {
    fn take(&mut self) -> Option<ClonedTransaction> {
        self.pending.take()
    }
}
