//! ID prefix constants for locally-owned entities.
//!
//! Local IDs have the form `{prefix}-{8 hex chars}` (e.g. `cus-a3f8b2c1`).
//! The full local ID is what gets written into the remote external-reference
//! field, so it must stay stable for the lifetime of the entity.

pub const PREFIX_CUSTOMER: &str = "cus";
pub const PREFIX_PLAN: &str = "pln";
pub const PREFIX_MEMBERSHIP: &str = "mbr";
pub const PREFIX_INVOICE: &str = "inv";

/// Split a local ID into `(prefix, suffix)`.
///
/// Returns `None` when the ID has no `-` separator or either side is empty.
#[must_use]
pub fn split_id(id: &str) -> Option<(&str, &str)> {
    let (prefix, suffix) = id.split_once('-')?;
    if prefix.is_empty() || suffix.is_empty() {
        return None;
    }
    Some((prefix, suffix))
}
