use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::RemoteId;

/// Links a customer to a plan. Maps to a remote subscription.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Membership {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    pub plan_id: String,
    pub remote_subscription_id: Option<RemoteId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
