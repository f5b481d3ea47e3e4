//! Integration tests for TOML + environment configuration loading.
//!
//! Uses figment::Jail for sandboxed env var manipulation.

use bridge_config::{AuthMode, BridgeConfig, ConfigError, ConfigProvider};
use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn figment_from(file: &str) -> Figment {
    Figment::from(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("ERPBRIDGE_").split("__"))
}

#[test]
fn loads_erp_connection_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[erp]
url = "https://erp.example.com"
database = "acme-prod"
login = "bridge@acme"
password = "pw"
timeout_secs = 12
"#,
        )?;

        let config: BridgeConfig = figment_from("config.toml").extract()?;

        assert_eq!(config.erp.url, "https://erp.example.com");
        assert_eq!(config.erp.database, "acme-prod");
        assert_eq!(config.erp.login, "bridge@acme");
        assert_eq!(config.erp.timeout_secs, 12);
        assert_eq!(config.erp.auth_mode, AuthMode::Password);
        assert!(config.erp.is_configured());
        Ok(())
    });
}

#[test]
fn loads_tenant_overrides_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[erp]
url = "https://shared.example.com"
database = "shared"
login = "bridge"
password = "pw"

[tenants.globex]
url = "https://globex.example.com"
database = "globex"
auth_mode = "oauth"
client_id = "cid"
client_secret = "csecret"
token_url = "https://globex.example.com/oauth/token"
"#,
        )?;

        let config: BridgeConfig = figment_from("config.toml").extract()?;
        let globex = config.connection_for("globex").expect("globex configured");
        assert_eq!(globex.auth_mode, AuthMode::Oauth);
        assert_eq!(globex.client_id, "cid");

        let other = config.connection_for("initech").expect("falls back to erp");
        assert_eq!(other.url, "https://shared.example.com");
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[erp]
url = "https://from-toml.example.com"
[sync]
concurrency = 2
"#,
        )?;
        jail.set_env("ERPBRIDGE_ERP__URL", "https://from-env.example.com");
        jail.set_env("ERPBRIDGE_SYNC__MAX_ATTEMPTS", "3");

        let config: BridgeConfig = figment_from("config.toml").extract()?;
        assert_eq!(config.erp.url, "https://from-env.example.com");
        assert_eq!(config.sync.concurrency, 2);
        assert_eq!(config.sync.max_attempts, 3);
        assert!(config.sync.retries_enabled());
        Ok(())
    });
}

#[test]
fn load_reads_project_config_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".erpbridge")?;
        jail.create_file(
            ".erpbridge/config.toml",
            r#"
[store]
path = "/var/lib/erpbridge/ledger.db"
"#,
        )?;

        let config = BridgeConfig::load().expect("config loads");
        assert_eq!(config.store.path, "/var/lib/erpbridge/ledger.db");
        Ok(())
    });
}

#[rstest]
#[case("ERPBRIDGE_SYNC__CONCURRENCY", "sync.concurrency")]
#[case("ERPBRIDGE_SYNC__MAX_ATTEMPTS", "sync.max_attempts")]
#[case("ERPBRIDGE_ERP__TIMEOUT_SECS", "erp.timeout_secs")]
fn load_rejects_zero_values(#[case] var: &str, #[case] field: &str) {
    Jail::expect_with(|jail| {
        jail.set_env(var, "0");
        let err = BridgeConfig::load().unwrap_err();
        match err {
            ConfigError::InvalidValue { field: got, .. } => assert_eq!(got, field),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        Ok(())
    });
}
