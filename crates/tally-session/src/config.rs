//! # Session Configuration
//!
//! Configuration for entry sessions: print templates, session defaults and
//! where the price memory lives.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_PRINT_TEMPLATE=ledger                                        │
//! │     TALLY_DEFAULT_MODE=credit                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/tally.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tally.pos/tally.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     PaymentMode::Cash, reserve 0, template "ledger"                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # tally.toml
//! [print]
//! template_id = "ledger"
//! merged_template_id = "ledger-merged"
//!
//! [session]
//! default_mode = "CASH"
//! default_reserve = 2000
//!
//! [storage]
//! price_memory_path = "/var/lib/tally/prices.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tally_core::validation::validate_template_id;
use tally_core::PaymentMode;
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};

const CONFIG_FILE_NAME: &str = "tally.toml";
const PRICE_MEMORY_FILE_NAME: &str = "prices.json";

// =============================================================================
// Print Settings
// =============================================================================

/// Print template selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintSettings {
    /// Template for printing the live ledger.
    #[serde(default = "default_template_id")]
    pub template_id: String,

    /// Template for printing a merged manifest.
    #[serde(default = "default_merged_template_id")]
    pub merged_template_id: String,
}

fn default_template_id() -> String {
    "ledger".to_string()
}

fn default_merged_template_id() -> String {
    "ledger-merged".to_string()
}

impl Default for PrintSettings {
    fn default() -> Self {
        PrintSettings {
            template_id: default_template_id(),
            merged_template_id: default_merged_template_id(),
        }
    }
}

// =============================================================================
// Session Defaults
// =============================================================================

/// Values a fresh session starts with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDefaults {
    /// Payment mode of a fresh session.
    #[serde(default)]
    pub default_mode: PaymentMode,

    /// Reserve pre-filled into the drawer.
    #[serde(default)]
    pub default_reserve: f64,
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Local storage locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Price memory file. Defaults to `prices.json` in the platform data
    /// directory.
    #[serde(default)]
    pub price_memory_path: Option<PathBuf>,
}

// =============================================================================
// Main Session Configuration
// =============================================================================

/// Complete session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub print: PrintSettings,

    #[serde(default)]
    pub session: SessionDefaults,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl SessionConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tally.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SessionResult<()> {
        for template_id in [&self.print.template_id, &self.print.merged_template_id] {
            validate_template_id(template_id).map_err(|e| {
                SessionError::InvalidConfig(format!("template '{}': {}", template_id, e))
            })?;
        }

        let reserve = self.session.default_reserve;
        if !reserve.is_finite() || reserve < 0.0 {
            return Err(SessionError::InvalidConfig(format!(
                "default_reserve must be a non-negative number, got {}",
                reserve
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(template) = std::env::var("TALLY_PRINT_TEMPLATE") {
            debug!(template = %template, "Overriding print template from environment");
            self.print.template_id = template;
        }

        if let Ok(template) = std::env::var("TALLY_MERGED_TEMPLATE") {
            self.print.merged_template_id = template;
        }

        if let Ok(mode) = std::env::var("TALLY_DEFAULT_MODE") {
            match mode.parse::<PaymentMode>() {
                Ok(parsed) => {
                    debug!(mode = %parsed, "Overriding default payment mode from environment");
                    self.session.default_mode = parsed;
                }
                Err(e) => warn!(mode = %mode, "Ignoring TALLY_DEFAULT_MODE: {}", e),
            }
        }

        if let Ok(reserve) = std::env::var("TALLY_DEFAULT_RESERVE") {
            match reserve.trim().parse::<f64>() {
                Ok(r) => self.session.default_reserve = r,
                Err(_) => warn!(reserve = %reserve, "Ignoring unparsable TALLY_DEFAULT_RESERVE"),
            }
        }

        if let Ok(path) = std::env::var("TALLY_PRICE_MEMORY_PATH") {
            self.storage.price_memory_path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "tally", "pos")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Returns the configured price memory file, falling back to the
    /// platform data directory.
    pub fn price_memory_path(&self) -> Option<PathBuf> {
        self.storage.price_memory_path.clone().or_else(|| {
            Self::project_dirs().map(|dirs| dirs.data_dir().join(PRICE_MEMORY_FILE_NAME))
        })
    }

    /// Template id for a print request.
    pub fn template_for(&self, merged: bool) -> &str {
        if merged {
            &self.print.merged_template_id
        } else {
            &self.print.template_id
        }
    }
}
