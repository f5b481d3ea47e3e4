//! Shared test utilities for bridge-db unit tests.

pub(crate) mod helpers {
    use crate::LedgerDb;
    use crate::service::LedgerService;

    /// Create an in-memory `LedgerService`.
    pub async fn test_service() -> LedgerService {
        let db = LedgerDb::open_local(":memory:").await.unwrap();
        LedgerService::from_db(db)
    }
}
