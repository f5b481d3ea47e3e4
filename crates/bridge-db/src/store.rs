//! The persistence interface the sync core consumes.
//!
//! The orchestrator only ever needs read-by-id, list-by-tenant, and the
//! remote-id write-back. Keeping that surface behind a trait lets hosts plug
//! in their own storage and lets tests inject stores that lose writes.

use async_trait::async_trait;
use bridge_core::RemoteId;
use bridge_core::entities::{Customer, Invoice, Membership, Plan};

use crate::error::DatabaseError;
use crate::service::LedgerService;

/// Read and map local entities.
///
/// A successful `set_*_remote_id` must be durable: once it returns `Ok`, a
/// subsequent `get_*` from any caller observes the new value.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn customer(&self, id: &str) -> Result<Customer, DatabaseError>;
    async fn plan(&self, id: &str) -> Result<Plan, DatabaseError>;
    async fn membership(&self, id: &str) -> Result<Membership, DatabaseError>;
    async fn invoice(&self, id: &str) -> Result<Invoice, DatabaseError>;

    async fn customers_for_tenant(&self, tenant_id: &str) -> Result<Vec<Customer>, DatabaseError>;
    async fn plans_for_tenant(&self, tenant_id: &str) -> Result<Vec<Plan>, DatabaseError>;
    async fn memberships_for_tenant(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<Membership>, DatabaseError>;

    async fn set_customer_remote_id(&self, id: &str, remote_id: RemoteId)
    -> Result<(), DatabaseError>;
    async fn set_plan_remote_id(&self, id: &str, remote_id: RemoteId) -> Result<(), DatabaseError>;
    async fn set_membership_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError>;
    async fn set_invoice_remote_id(&self, id: &str, remote_id: RemoteId)
    -> Result<(), DatabaseError>;
}

#[async_trait]
impl LocalStore for LedgerService {
    async fn customer(&self, id: &str) -> Result<Customer, DatabaseError> {
        self.get_customer(id).await
    }

    async fn plan(&self, id: &str) -> Result<Plan, DatabaseError> {
        self.get_plan(id).await
    }

    async fn membership(&self, id: &str) -> Result<Membership, DatabaseError> {
        self.get_membership(id).await
    }

    async fn invoice(&self, id: &str) -> Result<Invoice, DatabaseError> {
        self.get_invoice(id).await
    }

    async fn customers_for_tenant(&self, tenant_id: &str) -> Result<Vec<Customer>, DatabaseError> {
        self.list_customers(tenant_id).await
    }

    async fn plans_for_tenant(&self, tenant_id: &str) -> Result<Vec<Plan>, DatabaseError> {
        self.list_plans(tenant_id).await
    }

    async fn memberships_for_tenant(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<Membership>, DatabaseError> {
        self.list_memberships(tenant_id).await
    }

    async fn set_customer_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        Self::set_customer_remote_id(self, id, remote_id).await
    }

    async fn set_plan_remote_id(&self, id: &str, remote_id: RemoteId) -> Result<(), DatabaseError> {
        Self::set_plan_remote_id(self, id, remote_id).await
    }

    async fn set_membership_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        Self::set_membership_remote_id(self, id, remote_id).await
    }

    async fn set_invoice_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        Self::set_invoice_remote_id(self, id, remote_id).await
    }
}
