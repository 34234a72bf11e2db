//! # Durable Stores
//!
//! File-backed implementation of the core [`PriceMemory`] port.
//!
//! The price file is a flat JSON object of product id to last price:
//! ```json
//! { "p-tea": 20.0, "p-rice": 35.5 }
//! ```
//!
//! Writes happen on every `remember` and never fail the edit that caused
//! them: a failed write is logged and the in-memory value still wins for the
//! rest of the session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tally_core::PriceMemory;
use tracing::{debug, warn};

use crate::error::SessionResult;

/// Price memory persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonPriceMemory {
    path: PathBuf,
    prices: BTreeMap<String, f64>,
}

impl JsonPriceMemory {
    /// Opens the price file, starting empty when it does not exist yet.
    ///
    /// ## Errors
    /// - `SessionError::Io` if the file exists but cannot be read
    /// - `SessionError::Json` if the file is not a JSON object of numbers
    pub fn open(path: impl Into<PathBuf>) -> SessionResult<Self> {
        let path = path.into();
        let prices = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            debug!(?path, "Price memory file not found, starting empty");
            BTreeMap::new()
        };

        Ok(JsonPriceMemory { path, prices })
    }

    /// Opens the price file, starting empty if it is unreadable.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::open(path.clone()).unwrap_or_else(|e| {
            warn!(?path, "Failed to read price memory: {}. Starting empty.", e);
            JsonPriceMemory {
                path,
                prices: BTreeMap::new(),
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    fn flush(&self) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.prices)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl PriceMemory for JsonPriceMemory {
    fn recall(&self, product_id: &str) -> Option<f64> {
        self.prices.get(product_id).copied()
    }

    fn remember(&mut self, product_id: &str, price: f64) {
        self.prices.insert(product_id.to_string(), price);
        if let Err(e) = self.flush() {
            warn!(path = ?self.path, product_id, "Failed to persist remembered price: {}", e);
        }
    }
}
