//! # bridge-config
//!
//! Layered configuration loading for erpbridge using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ERPBRIDGE_*` prefix, `__` as separator)
//! 2. Project-level `.erpbridge/config.toml`
//! 3. User-level `~/.config/erpbridge/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ERPBRIDGE_ERP__URL` -> `erp.url`,
//! `ERPBRIDGE_TENANTS__ACME__PASSWORD` -> `tenants.acme.password`, etc.
//! Env keys are lowercased, so tenant IDs configured through the
//! environment must be lowercase.
//!
//! # Usage
//!
//! ```no_run
//! use bridge_config::{BridgeConfig, ConfigProvider};
//!
//! let config = BridgeConfig::load_with_dotenv().expect("config");
//! let connection = config.connection_for("acme").expect("tenant configured");
//! println!("ERP URL: {}", connection.url);
//! ```

mod connection;
mod error;
mod store;
mod sync;

pub use connection::{AuthMode, ConnectionConfig};
pub use error::ConfigError;
pub use store::StoreConfig;
pub use sync::SyncConfig;

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Resolves the ERP connection to use for a tenant.
///
/// Sync and payment code receive a provider instead of reading process
/// globals, so tests and multi-tenant hosts can inject their own mapping.
pub trait ConfigProvider: Send + Sync {
    /// Connection settings for `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when no usable connection exists
    /// for the tenant.
    fn connection_for(&self, tenant_id: &str) -> Result<ConnectionConfig, ConfigError>;
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Default ERP connection, used by tenants without their own entry.
    #[serde(default)]
    pub erp: ConnectionConfig,
    /// Per-tenant connection overrides keyed by tenant ID.
    #[serde(default)]
    pub tenants: BTreeMap<String, ConnectionConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl ConfigProvider for BridgeConfig {
    fn connection_for(&self, tenant_id: &str) -> Result<ConnectionConfig, ConfigError> {
        if let Some(tenant) = self.tenants.get(tenant_id) {
            if tenant.is_configured() {
                return Ok(tenant.clone());
            }
            return Err(ConfigError::NotConfigured {
                section: format!("tenants.{tenant_id}"),
            });
        }
        if self.erp.is_configured() {
            return Ok(self.erp.clone());
        }
        Err(ConfigError::NotConfigured {
            section: "erp".to_string(),
        })
    }
}

impl BridgeConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".erpbridge/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("ERPBRIDGE_").split("__"))
    }

    /// Reject values that deserialize fine but cannot work at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.sync.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        let tenants = self
            .tenants
            .iter()
            .map(|(tenant_id, connection)| (format!("tenants.{tenant_id}"), connection));
        for (section, connection) in std::iter::once(("erp".to_string(), &self.erp)).chain(tenants) {
            if connection.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("{section}.timeout_secs"),
                    reason: "must be at least 1".into(),
                });
            }
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("erpbridge").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(url: &str) -> ConnectionConfig {
        ConnectionConfig {
            url: url.into(),
            database: "db".into(),
            login: "bridge".into(),
            password: "secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_is_unconfigured() {
        let config = BridgeConfig::default();
        assert!(!config.erp.is_configured());
        assert!(config.tenants.is_empty());
        assert_eq!(config.store.path, ".erpbridge/ledger.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tenant_entry_wins_over_default() {
        let mut config = BridgeConfig {
            erp: configured("https://default.example.com"),
            ..Default::default()
        };
        config
            .tenants
            .insert("acme".into(), configured("https://acme.example.com"));

        assert_eq!(
            config.connection_for("acme").unwrap().url,
            "https://acme.example.com"
        );
        assert_eq!(
            config.connection_for("globex").unwrap().url,
            "https://default.example.com"
        );
    }

    #[test]
    fn half_configured_tenant_does_not_fall_back() {
        let mut config = BridgeConfig {
            erp: configured("https://default.example.com"),
            ..Default::default()
        };
        config.tenants.insert(
            "acme".into(),
            ConnectionConfig {
                url: "https://acme.example.com".into(),
                ..Default::default()
            },
        );

        let err = config.connection_for("acme").unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { ref section } if section == "tenants.acme"));
    }

    #[test]
    fn missing_connection_is_not_configured() {
        let err = BridgeConfig::default().connection_for("acme").unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { ref section } if section == "erp"));
    }

    #[test]
    fn zero_concurrency_is_invalid() {
        let mut config = BridgeConfig::default();
        config.sync.concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sync.concurrency"));
    }
}
