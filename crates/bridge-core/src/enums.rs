//! Enums for billing cadence, entity kinds, and payment transaction state.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! [`TransactionState`] provides `allowed_next_states()` mirroring the
//! lifecycle the ERP drives.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// BillingCadence
// ---------------------------------------------------------------------------

/// How often a plan bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BillingCadence {
    Monthly,
    Yearly,
}

impl BillingCadence {
    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Kind of remote counterpart a local entity maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Remote partner for a local customer.
    Partner,
    /// Remote product for a local plan.
    Product,
    /// Remote subscription for a local membership.
    Subscription,
    /// Remote invoice (accounting move) for a local invoice.
    Invoice,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Product => "product",
            Self::Subscription => "subscription",
            Self::Invoice => "invoice",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PaymentDocument
// ---------------------------------------------------------------------------

/// ERP document type a payment transaction can settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDocument {
    Subscription,
    Invoice,
}

impl PaymentDocument {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Invoice => "invoice",
        }
    }
}

impl fmt::Display for PaymentDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TransactionState
// ---------------------------------------------------------------------------

/// State of a remote payment transaction.
///
/// ```text
/// draft → pending → authorized → done
///   ↘        ↘          ↘
///    cancel / error (from any non-terminal state)
/// ```
///
/// `done` and `cancel` are terminal. `error` is not, so it can still be
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Draft,
    Pending,
    Authorized,
    Done,
    Cancel,
    Error,
}

impl TransactionState {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Pending, Self::Cancel, Self::Error],
            Self::Pending => &[Self::Authorized, Self::Cancel, Self::Error],
            Self::Authorized => &[Self::Done, Self::Cancel, Self::Error],
            Self::Error => &[Self::Cancel],
            Self::Done | Self::Cancel => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Validate the move from `self` to `next` for the transaction `id`.
    /// Staying in the same state is always valid.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] if the lifecycle forbids it.
    pub fn check_transition(self, next: Self, id: &str) -> Result<(), CoreError> {
        if self == next || self.can_transition_to(next) {
            return Ok(());
        }
        Err(CoreError::InvalidTransition {
            entity_type: "payment_transaction",
            id: id.to_string(),
            from: self,
            to: next,
        })
    }

    /// `done` and `cancel` never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancel)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::Done => "done",
            Self::Cancel => "cancel",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_happy_path_is_allowed() {
        assert!(TransactionState::Draft.can_transition_to(TransactionState::Pending));
        assert!(TransactionState::Pending.can_transition_to(TransactionState::Authorized));
        assert!(TransactionState::Authorized.can_transition_to(TransactionState::Done));
    }

    #[test]
    fn cancel_and_error_reachable_from_non_terminal_states() {
        for state in [
            TransactionState::Draft,
            TransactionState::Pending,
            TransactionState::Authorized,
        ] {
            assert!(state.can_transition_to(TransactionState::Cancel), "{state}");
            assert!(state.can_transition_to(TransactionState::Error), "{state}");
        }
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for state in [TransactionState::Done, TransactionState::Cancel] {
            assert!(state.is_terminal());
            assert!(state.allowed_next_states().is_empty());
        }
        assert!(!TransactionState::Error.is_terminal());
    }

    #[test]
    fn check_transition_reports_both_states() {
        assert!(TransactionState::Pending
            .check_transition(TransactionState::Pending, "tx-1")
            .is_ok());
        assert!(TransactionState::Pending
            .check_transition(TransactionState::Authorized, "tx-1")
            .is_ok());

        let err = TransactionState::Done
            .check_transition(TransactionState::Pending, "tx-1")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition: payment_transaction tx-1 from done to pending"
        );
    }

    #[test]
    fn no_skipping_backwards() {
        assert!(!TransactionState::Done.can_transition_to(TransactionState::Pending));
        assert!(!TransactionState::Authorized.can_transition_to(TransactionState::Draft));
    }

    #[test]
    fn transaction_state_parses_remote_strings() {
        let state: TransactionState = serde_json::from_str("\"authorized\"").unwrap();
        assert_eq!(state, TransactionState::Authorized);
        assert!(serde_json::from_str::<TransactionState>("\"refunded\"").is_err());
    }

    #[test]
    fn as_str_matches_serde() {
        for cadence in [BillingCadence::Monthly, BillingCadence::Yearly] {
            let json = serde_json::to_string(&cadence).unwrap();
            assert_eq!(json, format!("\"{}\"", cadence.as_str()));
        }
        for kind in [
            EntityKind::Partner,
            EntityKind::Product,
            EntityKind::Subscription,
            EntityKind::Invoice,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
