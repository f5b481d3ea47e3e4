//! JSON-RPC over HTTP transport.
//!
//! Logs in through `/web/session/authenticate` and executes calls through
//! `/web/dataset/call_kw/{model}/{method}`, presenting the session as the
//! `session_id` cookie. Response envelopes are decoded here so that error
//! payloads become typed [`ConnectorError`]s before leaving the transport.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bridge_config::ConnectionConfig;
use serde::Serialize;
use serde_json::{Value, json};

use crate::auth::{Credentials, Session};
use crate::error::ConnectorError;
use crate::transport::{RpcCall, RpcTransport};

/// Remote error code the ERP uses for an invalid or expired session.
const SESSION_EXPIRED_CODE: i64 = 100;

#[derive(Serialize)]
struct Envelope<'a, P: Serialize> {
    jsonrpc: &'static str,
    method: &'static str,
    params: &'a P,
    id: u64,
}

/// reqwest-backed [`RpcTransport`].
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a per-call `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConnectorError> {
        let http = reqwest::Client::builder()
            .user_agent("erpbridge/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a transport from connection settings.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, ConnectorError> {
        Self::new(config.base_url(), Duration::from_secs(config.timeout_secs))
    }

    async fn post<P: Serialize + Sync>(
        &self,
        path: &str,
        params: &P,
        session: Option<&Session>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let envelope = Envelope {
            jsonrpc: "2.0",
            method: "call",
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&envelope);
        if let Some(session) = session {
            request = request.header(reqwest::header::COOKIE, format!("session_id={}", session.token));
        }
        request.send().await
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ConnectorError> {
        let Credentials::Password {
            database,
            login,
            password,
        } = credentials
        else {
            return Err(ConnectorError::Unimplemented(
                "OAuth client-credentials authentication",
            ));
        };

        let params = json!({"db": database, "login": login, "password": password});
        let resp = self
            .post("/web/session/authenticate", &params, None)
            .await
            .map_err(|e| ConnectorError::Authentication(format!("ERP unreachable: {e}")))?;
        if !resp.status().is_success() {
            return Err(ConnectorError::Authentication(format!(
                "login returned HTTP {}",
                resp.status().as_u16()
            )));
        }

        let cookie_token = session_cookie(resp.headers());
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ConnectorError::Authentication(format!("unreadable login response: {e}")))?;
        let result = match decode_envelope(body) {
            Ok(result) => result,
            Err(ConnectorError::Rpc { message, .. }) => {
                return Err(ConnectorError::Authentication(message));
            }
            Err(ConnectorError::SessionExpired) => {
                return Err(ConnectorError::Authentication("session rejected".into()));
            }
            Err(other) => return Err(other),
        };

        let uid = result
            .get("uid")
            .and_then(Value::as_i64)
            .ok_or_else(|| ConnectorError::Authentication("invalid login or password".into()))?;
        let token = cookie_token
            .or_else(|| {
                result
                    .get("session_id")
                    .and_then(Value::as_str)
                    .map(String::from)
            })
            .ok_or_else(|| {
                ConnectorError::Authentication("login response carried no session token".into())
            })?;

        Ok(Session::new(token, uid))
    }

    async fn execute(&self, session: &Session, call: &RpcCall) -> Result<Value, ConnectorError> {
        let path = format!("/web/dataset/call_kw/{}/{}", call.model, call.method);
        let resp = self.post(&path, call, Some(session)).await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ConnectorError::SessionExpired);
        }
        if status.is_server_error() {
            return Err(ConnectorError::Transport {
                message: format!("HTTP {}: {}", status.as_u16(), resp.text().await.unwrap_or_default()),
                timed_out: false,
            });
        }
        if !status.is_success() {
            return Err(ConnectorError::Rpc {
                name: format!("http_{}", status.as_u16()),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body: Value = resp.json().await?;
        decode_envelope(body)
    }
}

/// Extract `session_id` from `Set-Cookie` headers.
fn session_cookie(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().strip_prefix("session_id="))
        .find(|token| !token.is_empty())
        .map(String::from)
}

/// Split a JSON-RPC response into its `result` or a typed error.
fn decode_envelope(body: Value) -> Result<Value, ConnectorError> {
    let Value::Object(mut map) = body else {
        return Err(ConnectorError::Protocol("response is not a JSON object".into()));
    };

    if let Some(error) = map.remove("error") {
        return Err(remote_error(&error));
    }
    map.remove("result")
        .ok_or_else(|| ConnectorError::Protocol("response has neither result nor error".into()))
}

fn remote_error(error: &Value) -> ConnectorError {
    let code = error.get("code").and_then(Value::as_i64);
    let data = error.get("data");
    let name = data
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    if code == Some(SESSION_EXPIRED_CODE) || name.contains("SessionExpired") {
        return ConnectorError::SessionExpired;
    }

    let message = data
        .and_then(|d| d.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .or_else(|| error.get("message").and_then(Value::as_str))
        .unwrap_or("unknown remote error");

    ConnectorError::Rpc {
        name: if name.is_empty() { "unknown".to_string() } else { name.to_string() },
        message: message.to_string(),
    }
}
