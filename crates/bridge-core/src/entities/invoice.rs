use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::RemoteId;

/// A one-off charge against a customer. Maps to a posted remote invoice.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Invoice {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    /// Amount due, in minor currency units.
    pub amount_cents: i64,
    pub description: String,
    pub remote_invoice_id: Option<RemoteId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
