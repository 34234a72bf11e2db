//! # Collaborator Ports
//!
//! The remote services an entry session talks to. The session only sees
//! these traits; HTTP clients, PDF renderers and test fakes implement them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  EntrySession::load ─────────► ProductCatalog::fetch_products           │
//! │                                                                         │
//! │  EntrySession::submit ───────► SaleSink::submit_sale                    │
//! │                                                                         │
//! │  EntrySession::print_merged ─► SaleHistory::today_records               │
//! │  EntrySession::print ────────► PrintService::render                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calls are awaited one at a time by the session that owns them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tally_core::{CatalogProduct, SaleRecord};

use crate::error::BackendError;
use crate::session::{PrintPayload, SalePayload};

/// Result type for collaborator calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Source of the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn fetch_products(&self) -> BackendResult<Vec<CatalogProduct>>;
}

/// Read access to sales submitted earlier today.
#[async_trait]
pub trait SaleHistory: Send + Sync {
    async fn today_records(&self) -> BackendResult<Vec<SaleRecord>>;
}

/// Destination for completed sales.
#[async_trait]
pub trait SaleSink: Send + Sync {
    async fn submit_sale(&self, payload: &SalePayload) -> BackendResult<()>;
}

/// Renders a print payload into a printable document.
#[async_trait]
pub trait PrintService: Send + Sync {
    async fn render(&self, payload: &PrintPayload) -> BackendResult<RenderedDocument>;
}

/// A rendered document ready for the printer or a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl RenderedDocument {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        RenderedDocument {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
