//! Boundary parsing for loosely-typed ERP values.
//!
//! The ERP encodes "no value" as `false` and relations as `[id, "display
//! name"]`. These helpers turn those shapes into typed Rust values at the
//! edge of the connector so nothing downstream handles raw JSON.

use bridge_core::RemoteId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

/// Search domain matching records whose `field` equals `value`.
pub fn domain_eq(field: &str, value: impl Into<Value>) -> Value {
    json!([[field, "=", value.into()]])
}

/// Deserialize a many-to-one relation (`[id, name]`, a bare id, `false`, or `null`).
///
/// # Errors
///
/// Fails on any other shape.
pub fn many2one<'de, D>(deserializer: D) -> Result<Option<RemoteId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(|id| Some(RemoteId(id)))
            .ok_or_else(|| D::Error::custom(format!("relation id is not an integer: {n}"))),
        Value::Array(items) => items
            .first()
            .and_then(Value::as_i64)
            .map(|id| Some(RemoteId(id)))
            .ok_or_else(|| D::Error::custom("relation pair does not start with an integer id")),
        other => Err(D::Error::custom(format!("unexpected relation value: {other}"))),
    }
}

/// Deserialize a char field that the ERP reports as `false` when empty.
///
/// # Errors
///
/// Fails when the value is neither a string, `false`, nor `null`.
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(D::Error::custom(format!("expected string or false, got {other}"))),
    }
}

/// A record projection carrying only its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IdOnly {
    pub id: RemoteId,
}

/// Interpret the result of a `create` call.
///
/// Older ERP versions return the bare id, newer ones a one-element list.
pub(crate) fn created_id(value: &Value) -> Option<RemoteId> {
    match value {
        Value::Number(n) => n.as_i64().map(RemoteId),
        Value::Array(items) if items.len() == 1 => items[0].as_i64().map(RemoteId),
        _ => None,
    }
}
