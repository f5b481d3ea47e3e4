//! Service layer over the ledger database.
//!
//! `LedgerService` wraps `LedgerDb`. All repo methods are implemented as
//! `impl LedgerService` blocks in [`crate::repos`].

use bridge_core::RemoteId;
use chrono::Utc;

use crate::LedgerDb;
use crate::error::DatabaseError;

/// Owns the ledger database and hosts the per-entity repository methods.
pub struct LedgerService {
    db: LedgerDb,
}

impl LedgerService {
    /// Open (or create) the ledger at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = LedgerDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create from an existing `LedgerDb`.
    #[must_use]
    pub const fn from_db(db: LedgerDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &LedgerDb {
        &self.db
    }

    /// Record the remote identifier for a row.
    ///
    /// The update is a single autocommitted statement, so the mapping is
    /// durable once this returns `Ok`. Writing the same value twice is a
    /// no-op; writing a different value over an existing mapping is rejected.
    pub(crate) async fn set_remote_id(
        &self,
        table: &'static str,
        column: &'static str,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let affected = self
            .db
            .conn()
            .execute(
                &format!(
                    "UPDATE {table} SET {column} = ?1, updated_at = ?2
                     WHERE id = ?3 AND ({column} IS NULL OR {column} = ?1)"
                ),
                libsql::params![remote_id.get(), now, id],
            )
            .await?;

        if affected == 1 {
            tracing::debug!(table, id, %remote_id, "remote id recorded");
            return Ok(());
        }

        let mut rows = self
            .db
            .conn()
            .query(&format!("SELECT {column} FROM {table} WHERE id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let existing = row.get::<Option<i64>>(0)?.ok_or_else(|| {
            DatabaseError::InvalidState(format!("{table} {id}: update matched no row"))
        })?;
        Err(DatabaseError::MappingConflict {
            table,
            id: id.to_string(),
            existing,
            attempted: remote_id.get(),
        })
    }
}
