//! Locally-owned entities mirrored into the ERP.
//!
//! Each entity maps to a table in the local libSQL store and carries a
//! nullable remote identifier that is populated by the first successful
//! reconciliation and never cleared afterwards.

mod customer;
mod invoice;
mod membership;
mod plan;

pub use customer::Customer;
pub use invoice::Invoice;
pub use membership::Membership;
pub use plan::Plan;
