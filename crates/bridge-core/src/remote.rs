use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier assigned to a record by the remote ERP.
///
/// Serialized as a bare integer so it can be stored in an `INTEGER` column
/// and sent over JSON-RPC unchanged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RemoteId(pub i64);

impl RemoteId {
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for RemoteId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
