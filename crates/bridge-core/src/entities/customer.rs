use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::RemoteId;

/// A paying customer. Maps to a remote partner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub remote_customer_id: Option<RemoteId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
