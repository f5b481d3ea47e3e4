//! Local store settings.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".erpbridge/ledger.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}
