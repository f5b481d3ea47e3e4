//! Session-managing connector.
//!
//! The connector authenticates lazily on the first call and keeps the session
//! in memory. Concurrent first calls serialize on an authentication gate so
//! only one login is issued; once a session exists, calls only take a shared
//! read lock. A call rejected with [`ConnectorError::SessionExpired`]
//! re-authenticates once and is retried a single time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bridge_config::ConnectionConfig;
use bridge_core::RemoteId;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::sync::{Mutex, RwLock};

use crate::auth::{Credentials, Session};
use crate::error::ConnectorError;
use crate::fields::created_id;
use crate::http::HttpTransport;
use crate::transport::{RpcCall, RpcTransport};

/// Optional parameters for [`Connector::search_read`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    /// Sort specification, e.g. `"id asc"`.
    pub order: Option<String>,
}

/// Authenticated handle on one ERP instance.
pub struct Connector {
    transport: Arc<dyn RpcTransport>,
    credentials: Credentials,
    session: RwLock<Option<Arc<Session>>>,
    auth_gate: Mutex<()>,
    generation: AtomicU64,
}

impl Connector {
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            session: RwLock::new(None),
            auth_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Build a connector over HTTP from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, ConnectorError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(
            Arc::new(transport),
            Credentials::from_config(config),
        ))
    }

    /// Open a fresh session, replacing any current one.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::Unimplemented`] for OAuth credentials;
    /// [`ConnectorError::Authentication`] when the login is rejected.
    pub async fn authenticate(&self) -> Result<Arc<Session>, ConnectorError> {
        let _gate = self.auth_gate.lock().await;
        self.login_locked().await
    }

    /// Whether a session is currently held.
    pub async fn has_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Perform one remote call, authenticating first if needed.
    ///
    /// # Errors
    ///
    /// Propagates the transport's [`ConnectorError`]; a session expiry is
    /// surfaced only if it recurs right after re-authenticating.
    pub async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, ConnectorError> {
        let call = RpcCall::new(model, method, args, kwargs);
        let session = self.current_session().await?;

        match self.transport.execute(&session, &call).await {
            Err(e) if e.is_auth_failure() => {
                tracing::warn!(model, method, "ERP session rejected; re-authenticating once");
                self.invalidate(&session).await;
                let session = self.current_session().await?;
                self.transport.execute(&session, &call).await
            }
            other => other,
        }
    }

    /// Search `model` with `domain` and decode each record into `T`.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::Protocol`] if the records do not match `T`.
    pub async fn search_read<T: DeserializeOwned>(
        &self,
        model: &str,
        domain: Value,
        fields: &[&str],
        options: SearchOptions,
    ) -> Result<Vec<T>, ConnectorError> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".into(), json!(fields));
        if let Some(limit) = options.limit {
            kwargs.insert("limit".into(), json!(limit));
        }
        if let Some(order) = options.order {
            kwargs.insert("order".into(), json!(order));
        }

        let value = self.call(model, "search_read", vec![domain], kwargs).await?;
        serde_json::from_value(value)
            .map_err(|e| ConnectorError::Protocol(format!("{model}.search_read: {e}")))
    }

    /// Read one record by id. Returns `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::Protocol`] if the record does not match `T`.
    pub async fn read_one<T: DeserializeOwned>(
        &self,
        model: &str,
        id: RemoteId,
        fields: &[&str],
    ) -> Result<Option<T>, ConnectorError> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".into(), json!(fields));
        let value = self
            .call(model, "read", vec![json!([id.get()])], kwargs)
            .await?;
        let records: Vec<T> = serde_json::from_value(value)
            .map_err(|e| ConnectorError::Protocol(format!("{model}.read: {e}")))?;
        Ok(records.into_iter().next())
    }

    /// Create a record and return its id.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::Protocol`] if the ERP does not answer with an id.
    pub async fn create(
        &self,
        model: &str,
        values: Map<String, Value>,
    ) -> Result<RemoteId, ConnectorError> {
        let value = self
            .call(model, "create", vec![Value::Object(values)], Map::new())
            .await?;
        created_id(&value).ok_or_else(|| {
            ConnectorError::Protocol(format!("{model}.create returned {value} instead of an id"))
        })
    }

    /// Invoke a record method (e.g. a workflow action) on `ids`.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::call`] errors.
    pub async fn call_method(
        &self,
        model: &str,
        method: &str,
        ids: &[RemoteId],
        kwargs: Map<String, Value>,
    ) -> Result<Value, ConnectorError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        self.call(model, method, vec![json!(ids)], kwargs).await
    }

    async fn current_session(&self) -> Result<Arc<Session>, ConnectorError> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(session);
        }

        let _gate = self.auth_gate.lock().await;
        // Another caller may have logged in while we waited on the gate.
        if let Some(session) = self.session.read().await.clone() {
            return Ok(session);
        }
        self.login_locked().await
    }

    /// Must be called with `auth_gate` held.
    async fn login_locked(&self) -> Result<Arc<Session>, ConnectorError> {
        if matches!(self.credentials, Credentials::OAuthClient { .. }) {
            return Err(ConnectorError::Unimplemented(
                "OAuth client-credentials authentication",
            ));
        }

        let mut session = self.transport.login(&self.credentials).await?;
        session.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(uid = session.uid, generation = session.generation, "ERP session established");

        let session = Arc::new(session);
        *self.session.write().await = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Drop the current session if it is still the one that failed.
    async fn invalidate(&self, stale: &Session) {
        let mut current = self.session.write().await;
        if current
            .as_ref()
            .is_some_and(|s| s.generation == stale.generation)
        {
            *current = None;
        }
    }
}
