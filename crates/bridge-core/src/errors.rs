//! Cross-cutting error types for erpbridge.
//!
//! Domain-specific errors (`DatabaseError`, `ConnectorError`, `SyncError`)
//! live in their respective crates.

use thiserror::Error;

use crate::enums::TransactionState;

/// Errors that can be raised by any erpbridge crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// An observed state change that the lifecycle does not allow.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: &'static str,
        id: String,
        from: TransactionState,
        to: TransactionState,
    },
}
