//! # Terminal Configuration
//!
//! Everything the terminal reads at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RXPOS_BACKEND_URL=https://pharmacy.example.com                     │
//! │     RXPOS_BRANCH_ID=3                                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $RXPOS_CONFIG, else                                                │
//! │     ~/.config/rxpos/terminal.toml (Linux)                              │
//! │     ~/Library/Application Support/com.rxpos.terminal/terminal.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost backend, 300 ms debounce, 12 % GST, 42-column receipt    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # terminal.toml
//! [backend]
//! base_url = "https://pharmacy.example.com"
//! auth_token = "..."
//!
//! [store]
//! branch_id = 3
//! branch_name = "MG Road"
//! tenant_id = 1
//! default_gst_percent = 12.0
//!
//! [lookup]
//! debounce_ms = 300
//! history_months = 6
//!
//! [operator]
//! name = "Asha"
//! roles = ["pharmacist"]
//! permissions = ["pos.discount.edit"]
//!
//! [receipt]
//! width = 42
//! currency_symbol = "₹"
//! spool_dir = "/var/spool/rxpos"   # optional; receipts go to stdout without it
//! ```
//!
//! Configuration is read-only after startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use rxpos_client::BackendConfig;
use rxpos_core::invoice::MIN_RECEIPT_WIDTH;
use rxpos_core::types::{Branch, EntityId, Percentage};
use rxpos_core::{Grants, DEFAULT_HISTORY_MONTHS};

use crate::error::PosError;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "RXPOS_CONFIG";

pub const CONFIG_FILE_NAME: &str = "terminal.toml";

// =============================================================================
// Sections
// =============================================================================

/// Which branch this terminal sells from, and its tax default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Without a branch the cashier must pick one before searching or selling.
    #[serde(default)]
    pub branch_id: Option<EntityId>,

    #[serde(default)]
    pub branch_name: Option<String>,

    #[serde(default)]
    pub tenant_id: Option<EntityId>,

    /// GST applied to catalog rows that carry no tax field.
    #[serde(default = "default_gst_percent")]
    pub default_gst_percent: f64,
}

fn default_gst_percent() -> f64 {
    12.0
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            branch_id: None,
            branch_name: None,
            tenant_id: None,
            default_gst_percent: default_gst_percent(),
        }
    }
}

impl StoreConfig {
    /// The configured branch, if any.
    pub fn branch(&self) -> Option<Branch> {
        self.branch_id.clone().map(|id| Branch {
            id,
            name: self.branch_name.clone(),
            tenant_id: self.tenant_id.clone(),
        })
    }

    pub fn default_gst(&self) -> Percentage {
        Percentage::clamped(self.default_gst_percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Quiet interval before a stock or customer search is sent.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_history_months")]
    pub history_months: u32,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_history_months() -> u32 {
    DEFAULT_HISTORY_MONTHS
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig {
            debounce_ms: default_debounce_ms(),
            history_months: default_history_months(),
        }
    }
}

impl LookupConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// The operator signed in at this terminal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub grants: Grants,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptConfig {
    /// Paper width in characters (typically 32, 42 or 48).
    #[serde(default = "default_receipt_width")]
    pub width: usize,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Directory receipts are written to. Receipts go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spool_dir: Option<PathBuf>,
}

fn default_receipt_width() -> usize {
    42
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        ReceiptConfig {
            width: default_receipt_width(),
            currency_symbol: default_currency_symbol(),
            spool_dir: None,
        }
    }
}

// =============================================================================
// Terminal Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub lookup: LookupConfig,

    #[serde(default)]
    pub operator: OperatorConfig,

    #[serde(default)]
    pub receipt: ReceiptConfig,
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`$RXPOS_CONFIG`, else the platform config dir)
    /// 3. Environment variables
    ///
    /// A missing file at the platform path means defaults; a missing file
    /// named by `RXPOS_CONFIG` is an error.
    pub fn load() -> Result<Self, PosError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, PosError> {
        info!(?path, "Loading terminal config from file");
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PosError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, PosError> {
        toml::from_str(contents).map_err(|e| PosError::config(e.to_string()))
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), PosError> {
        self.backend
            .validate()
            .map_err(|e| PosError::config(e.to_string()))?;

        let gst = self.store.default_gst_percent;
        if !gst.is_finite() || !(0.0..=100.0).contains(&gst) {
            return Err(PosError::config(
                "store.default_gst_percent must be between 0 and 100",
            ));
        }

        if self.lookup.history_months == 0 {
            return Err(PosError::config(
                "lookup.history_months must be greater than 0",
            ));
        }

        if self.receipt.width < MIN_RECEIPT_WIDTH {
            return Err(PosError::config(format!(
                "receipt.width must be at least {}",
                MIN_RECEIPT_WIDTH
            )));
        }

        Ok(())
    }

    /// Applies `RXPOS_*` overrides. `var` looks a variable up by name.
    ///
    /// Unparseable numeric values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Backend
        if let Some(url) = var("RXPOS_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.base_url = url;
        }
        if let Some(prefix) = var("RXPOS_API_PREFIX") {
            self.backend.api_prefix = prefix;
        }
        if let Some(token) = var("RXPOS_AUTH_TOKEN") {
            self.backend.auth_token = Some(token).filter(|t| !t.trim().is_empty());
        }
        if let Some(secs) = parsed(&var, "RXPOS_TIMEOUT_SECS") {
            self.backend.timeout_secs = secs;
        }

        // Store
        if let Some(id) = var("RXPOS_BRANCH_ID") {
            debug!(branch_id = %id, "Overriding branch from environment");
            self.store.branch_id = Some(EntityId::parse(&id));
        }
        if let Some(name) = var("RXPOS_BRANCH_NAME") {
            self.store.branch_name = Some(name);
        }
        if let Some(id) = var("RXPOS_TENANT_ID") {
            self.store.tenant_id = Some(EntityId::parse(&id));
        }
        if let Some(gst) = parsed(&var, "RXPOS_DEFAULT_GST") {
            self.store.default_gst_percent = gst;
        }

        // Lookup
        if let Some(ms) = parsed(&var, "RXPOS_DEBOUNCE_MS") {
            self.lookup.debounce_ms = ms;
        }
        if let Some(months) = parsed(&var, "RXPOS_HISTORY_MONTHS") {
            self.lookup.history_months = months;
        }

        // Operator
        if let Some(name) = var("RXPOS_OPERATOR_NAME") {
            self.operator.name = Some(name);
        }
        if let Some(roles) = var("RXPOS_OPERATOR_ROLES") {
            self.operator.grants.roles = split_list(&roles);
        }
        if let Some(keys) = var("RXPOS_OPERATOR_PERMISSIONS") {
            self.operator.grants.permissions = split_list(&keys);
        }

        // Receipt
        if let Some(width) = parsed(&var, "RXPOS_RECEIPT_WIDTH") {
            self.receipt.width = width;
        }
        if let Some(symbol) = var("RXPOS_CURRENCY_SYMBOL") {
            self.receipt.currency_symbol = symbol;
        }
        if let Some(dir) = var("RXPOS_SPOOL_DIR") {
            self.receipt.spool_dir = Some(PathBuf::from(dir));
        }
    }

    /// `<config_dir>/terminal.toml` for this platform.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "rxpos", "terminal")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn parsed<T, F>(var: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
