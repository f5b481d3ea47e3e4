//! Repository modules implementing persistence for each local entity.
//!
//! Each module adds methods to `LedgerService` via `impl LedgerService` blocks.

pub mod customer;
pub mod invoice;
pub mod membership;
pub mod plan;
