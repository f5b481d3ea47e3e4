//! Credentials and session state.

use bridge_config::{AuthMode, ConnectionConfig};

/// Credentials used to open an ERP session.
///
/// The [`Debug`] impl redacts secrets to prevent accidental credential
/// exposure in log output.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username/password session login against a named database.
    Password {
        database: String,
        login: String,
        password: String,
    },
    /// OAuth client-credentials grant.
    OAuthClient {
        client_id: String,
        client_secret: String,
        token_url: String,
    },
}

impl Credentials {
    /// Pick the credentials for the configured auth mode.
    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        match config.auth_mode {
            AuthMode::Password => Self::Password {
                database: config.database.clone(),
                login: config.login.clone(),
                password: config.password.clone(),
            },
            AuthMode::Oauth => Self::OAuthClient {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                token_url: config.token_url.clone(),
            },
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password {
                database, login, ..
            } => f
                .debug_struct("Password")
                .field("database", database)
                .field("login", login)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::OAuthClient {
                client_id,
                token_url,
                ..
            } => f
                .debug_struct("OAuthClient")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("token_url", token_url)
                .finish(),
        }
    }
}

/// An authenticated ERP session.
#[derive(Clone)]
pub struct Session {
    /// Opaque token presented on every call.
    pub token: String,
    /// Remote user the session belongs to.
    pub uid: i64,
    pub(crate) generation: u64,
}

impl Session {
    #[must_use]
    pub const fn new(token: String, uid: i64) -> Self {
        Self {
            token,
            uid,
            generation: 0,
        }
    }

    /// Monotonic counter assigned by the connector each time it logs in.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("uid", &self.uid)
            .field("generation", &self.generation)
            .finish()
    }
}
