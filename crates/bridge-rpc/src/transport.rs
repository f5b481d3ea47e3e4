//! The seam between the connector and the wire.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::{Credentials, Session};
use crate::error::ConnectorError;

/// A single remote-procedure call scoped to a model and method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcCall {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl RpcCall {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Self {
        Self {
            model: model.into(),
            method: method.into(),
            args,
            kwargs,
        }
    }
}

/// Executes logins and calls against an ERP.
///
/// Implementations are stateless with respect to sessions: the
/// [`Connector`](crate::Connector) owns session lifetime and passes the
/// current session into every call.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Open a new session.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::Authentication`] when the ERP rejects the
    /// credentials or cannot be reached.
    async fn login(&self, credentials: &Credentials) -> Result<Session, ConnectorError>;

    /// Execute `call` within `session` and return the raw `result` payload.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::SessionExpired`] when the session is no longer
    /// valid, [`ConnectorError::Rpc`] for remote application errors, and
    /// [`ConnectorError::Transport`] for network failures.
    async fn execute(&self, session: &Session, call: &RpcCall) -> Result<Value, ConnectorError>;
}
