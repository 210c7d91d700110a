//! # Backend Configuration
//!
//! Where the REST backend lives and how the client talks to it.
//!
//! ```toml
//! [backend]
//! base_url = "https://pharmacy.example.com"
//! api_prefix = "/api/v2"
//! timeout_secs = 15
//! auth_token = "..."   # optional static bearer token
//! stock_search_limit = 15
//! customer_search_limit = 10
//! ```
//!
//! Loading (file, environment) is the terminal's job; this type only holds
//! the values and checks them.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix every endpoint hangs off.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Per-request timeout. The only timeout in the client; nothing retries.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sent as `Authorization: Bearer <token>` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default = "default_stock_limit")]
    pub stock_search_limit: u32,

    #[serde(default = "default_customer_limit")]
    pub customer_search_limit: u32,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_api_prefix() -> String {
    "/api/v2".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_stock_limit() -> u32 {
    15
}

fn default_customer_limit() -> u32 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: default_timeout(),
            auth_token: None,
            stock_search_limit: default_stock_limit(),
            customer_search_limit: default_customer_limit(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL with the API prefix, ending in `/` so endpoints can be joined.
    ///
    /// ```rust
    /// use rxpos_client::config::BackendConfig;
    ///
    /// let config = BackendConfig::default();
    /// let root = config.api_root().unwrap();
    /// assert_eq!(root.join("sales").unwrap().as_str(), "http://localhost:3001/api/v2/sales");
    /// ```
    pub fn api_root(&self) -> ClientResult<Url> {
        let base = self.base_url.trim().trim_end_matches('/');
        let prefix = self.api_prefix.trim().trim_matches('/');
        let root = if prefix.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}/{}/", base, prefix)
        };
        Ok(Url::parse(&root)?)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::InvalidConfig("base_url must not be empty".into()));
        }

        let root = self.api_root()?;
        if !matches!(root.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.stock_search_limit == 0 || self.customer_search_limit == 0 {
            return Err(ClientError::InvalidConfig(
                "search limits must be greater than 0".into(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BackendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_api_root_normalises_slashes() {
        let config = BackendConfig {
            base_url: "https://rx.example.com/".into(),
            api_prefix: "api/v2/".into(),
            ..BackendConfig::default()
        };
        assert_eq!(
            config.api_root().unwrap().join("inventory/stock").unwrap().as_str(),
            "https://rx.example.com/api/v2/inventory/stock"
        );

        let bare = BackendConfig {
            api_prefix: String::new(),
            ..BackendConfig::default()
        };
        assert_eq!(bare.api_root().unwrap().as_str(), "http://localhost:3001/");
    }

    #[test]
    fn test_validation_failures() {
        let empty = BackendConfig {
            base_url: "  ".into(),
            ..BackendConfig::default()
        };
        assert!(matches!(empty.validate(), Err(ClientError::InvalidConfig(_))));

        let garbage = BackendConfig {
            base_url: "not a url".into(),
            ..BackendConfig::default()
        };
        assert!(matches!(garbage.validate(), Err(ClientError::InvalidUrl(_))));

        let ftp = BackendConfig {
            base_url: "ftp://files.example.com".into(),
            ..BackendConfig::default()
        };
        assert!(matches!(ftp.validate(), Err(ClientError::InvalidUrl(_))));

        let zero = BackendConfig {
            stock_search_limit: 0,
            ..BackendConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ClientError::InvalidConfig(_))));
    }
}
