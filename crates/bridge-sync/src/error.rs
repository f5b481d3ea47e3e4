//! Sync and payment error types.

use bridge_core::RemoteId;
use bridge_core::enums::{EntityKind, PaymentDocument};
use bridge_db::error::DatabaseError;
use bridge_rpc::ConnectorError;
use thiserror::Error;

/// Errors from reconciling local entities with the ERP.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote lookup or create failed for one entity. Nothing is rolled
    /// back: the entity may or may not exist remotely.
    #[error("failed to reconcile {kind} for {local_id}: {source}")]
    Reconciliation {
        kind: EntityKind,
        local_id: String,
        #[source]
        source: ConnectorError,
    },

    /// A prerequisite was synced but its remote id did not stick locally.
    #[error("{kind} {local_id}: prerequisite {missing} still has no remote id after sync")]
    DependencyResolution {
        kind: EntityKind,
        local_id: String,
        missing: EntityKind,
    },

    /// The entity, or one of its prerequisites, belongs to another tenant.
    #[error("{kind} {local_id} belongs to tenant {actual}, not {expected}")]
    TenantMismatch {
        kind: EntityKind,
        local_id: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

impl SyncError {
    /// Whether retrying the same item later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Reconciliation { source, .. } => source.is_retryable(),
            Self::DependencyResolution { .. } | Self::TenantMismatch { .. } | Self::Store(_) => {
                false
            }
        }
    }
}

/// Errors from creating payment links or reading transactions.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("no payment acquirer is enabled in the ERP")]
    NoAcquirerConfigured,

    #[error("currency {0} is not known to the ERP")]
    UnknownCurrency(String),

    #[error("{document} {id} not found in the ERP")]
    DocumentNotFound {
        document: PaymentDocument,
        id: RemoteId,
    },

    #[error("{document} {id} has no partner to bill")]
    DocumentWithoutPartner {
        document: PaymentDocument,
        id: RemoteId,
    },

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}
