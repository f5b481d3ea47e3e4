//! ERP connection settings.

use serde::{Deserialize, Serialize};

/// Default per-call timeout in seconds.
const fn default_timeout_secs() -> u64 {
    30
}

/// How the connector authenticates against the ERP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Username/password session login.
    #[default]
    Password,
    /// OAuth client-credentials grant.
    Oauth,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Base URL of the ERP (e.g., `https://erp.example.com`).
    #[serde(default)]
    pub url: String,

    /// ERP database name sent with the session login.
    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub auth_mode: AuthMode,

    #[serde(default)]
    pub login: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub token_url: String,

    /// Upper bound for a single HTTP round-trip.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            database: String::new(),
            auth_mode: AuthMode::default(),
            login: String::new(),
            password: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            token_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("auth_mode", &self.auth_mode)
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConnectionConfig {
    /// Check if the endpoint and the credentials for the selected auth mode are present.
    pub fn is_configured(&self) -> bool {
        if self.url.is_empty() || self.database.is_empty() {
            return false;
        }
        match self.auth_mode {
            AuthMode::Password => !self.login.is_empty() && !self.password.is_empty(),
            AuthMode::Oauth => {
                !self.client_id.is_empty()
                    && !self.client_secret.is_empty()
                    && !self.token_url.is_empty()
            }
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
