//! # bridge-sync
//!
//! Keeps locally-owned entities mapped to their ERP counterparts and brokers
//! hosted payments.
//!
//! - [`Reconciler`]: the ensure pattern (look up by external reference, else
//!   create) shared by partners, products, subscriptions, and invoices.
//! - [`SyncOrchestrator`]: dependency ordering (customer and plan before
//!   membership) and per-tenant batches with per-item failure isolation.
//! - [`PaymentBroker`]: payment links and transaction status.
//!
//! Sync runs local to remote only. Changes made in the ERP are not pulled back.

pub mod error;
pub mod orchestrator;
pub mod payment;
pub mod reconciler;
pub mod retry;

pub use error::{PaymentError, SyncError};
pub use orchestrator::{BatchFailure, BatchReport, SyncOrchestrator};
pub use payment::{Acquirer, PaymentBroker, PaymentLink, PaymentLinkRequest, TransactionStatus};
pub use reconciler::{Ensured, Reconciler, RemoteCounterpart};
pub use retry::RetryPolicy;
