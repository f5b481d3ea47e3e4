use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::RemoteId;
use crate::enums::BillingCadence;

/// A subscription plan offered by a tenant. Maps to a remote product.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Plan {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Price per billing period, in minor currency units.
    pub price_cents: i64,
    pub cadence: BillingCadence,
    pub remote_product_id: Option<RemoteId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
