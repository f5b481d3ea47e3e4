//! # bridge-db
//!
//! libSQL persistence for the entities erpbridge mirrors into the ERP:
//! customers, plans, memberships, and invoices.
//!
//! Each table carries a nullable remote-id column. The sync core reads it to
//! skip entities that are already mapped and writes it (through
//! [`store::LocalStore`]) right after a successful reconciliation.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

pub use service::LedgerService;
pub use store::LocalStore;

/// Database handle for local entity state.
pub struct LedgerDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl LedgerDb {
    /// Open a local database at the given path (`":memory:"` for tests).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let ledger = Self { db, conn };
        ledger.run_migrations().await?;
        Ok(ledger)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"cus-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::ids::{PREFIX_CUSTOMER, split_id};

    #[tokio::test]
    async fn open_in_memory_runs_migrations() {
        let db = LedgerDb::open_local(":memory:").await.unwrap();
        let mut rows = db
            .conn()
            .query(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('customers', 'plans', 'memberships', 'invoices')",
                (),
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 4);
    }

    #[tokio::test]
    async fn generate_id_has_prefix_and_hex_suffix() {
        let db = LedgerDb::open_local(":memory:").await.unwrap();
        let id = db.generate_id(PREFIX_CUSTOMER).await.unwrap();
        let (prefix, suffix) = split_id(&id).unwrap();
        assert_eq!(prefix, "cus");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = LedgerDb::open_local(":memory:").await.unwrap();
        db.run_migrations().await.unwrap();
    }
}
