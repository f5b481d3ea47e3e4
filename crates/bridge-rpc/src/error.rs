//! Connector error types.

use thiserror::Error;

/// Errors that can occur when talking to the ERP.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Login was rejected or the ERP could not be reached to log in.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The ERP no longer accepts the current session.
    #[error("ERP session expired")]
    SessionExpired,

    /// Network-level failure: connection refused, reset, or timed out.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        /// Whether the per-call timeout elapsed.
        timed_out: bool,
    },

    /// The ERP processed the call and returned an application error.
    #[error("remote error ({name}): {message}")]
    Rpc {
        /// Remote exception name (e.g., `odoo.exceptions.ValidationError`).
        name: String,
        message: String,
    },

    /// A credential mode the connector does not support yet.
    #[error("not implemented: {0}")]
    Unimplemented(&'static str),

    /// The ERP answered with something that is not a valid response.
    #[error("malformed ERP response: {0}")]
    Protocol(String),
}

impl ConnectorError {
    /// Errors that warrant one re-authentication and retry.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Errors a caller may reasonably retry later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            timed_out: error.is_timeout(),
            message: error.to_string(),
        }
    }
}
