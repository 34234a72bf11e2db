//! # tally-session: Entry Session Orchestration
//!
//! Wires the pure ledger logic of `tally-core` to the remote collaborators
//! of one entry session.
//!
//! ## Module Organization
//! ```text
//! tally_session/
//! ├── lib.rs      ◄─── You are here (tracing setup, exports)
//! ├── session.rs  ◄─── EntrySession, sale/print payloads
//! ├── ports.rs    ◄─── Async collaborator traits
//! ├── stores.rs   ◄─── File-backed price memory
//! ├── input.rs    ◄─── Keyboard/pointer input tracker
//! ├── config.rs   ◄─── tally.toml + TALLY_* environment
//! └── error.rs    ◄─── SessionError, BackendError
//! ```
//!
//! ## Example Usage
//! ```rust,no_run
//! use tally_session::{
//!     init_tracing, Collaborators, EntrySession, JsonPriceMemory, SessionConfig,
//! };
//! use tally_core::MemoryCloneSlot;
//!
//! async fn run(collaborators: Collaborators) -> tally_session::SessionResult<()> {
//!     init_tracing();
//!
//!     let config = SessionConfig::load_or_default(None);
//!     let prices = match config.price_memory_path() {
//!         Some(path) => JsonPriceMemory::open_or_empty(path),
//!         None => JsonPriceMemory::open_or_empty("prices.json"),
//!     };
//!
//!     let mut session = EntrySession::new(config, collaborators, Box::new(prices));
//!     session.load(&mut MemoryCloneSlot::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod ports;
pub mod session;
pub mod stores;

use tracing_subscriber::EnvFilter;

pub use config::SessionConfig;
pub use error::{BackendError, SessionError, SessionResult};
pub use input::{InputMethod, InputMethodTracker};
pub use ports::{PrintService, ProductCatalog, RenderedDocument, SaleHistory, SaleSink};
pub use session::{
    Collaborators, EntrySession, PrintPayload, PrintRow, SalePayload, SaleRow, SessionState,
};
pub use stores::JsonPriceMemory;

const DEFAULT_LOG_FILTER: &str = "info,tally_core=debug,tally_session=debug";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_session=trace` - Trace the session crate only
/// - Default: INFO, DEBUG for tally crates
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
