//! Dependency-ordered and batch synchronization.
//!
//! Single-entity operations return errors to the caller. Batch operations
//! isolate failures per item and report them in a [`BatchReport`] so that a
//! later pass can retry exactly the failed subset.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bridge_config::SyncConfig;
use bridge_core::RemoteId;
use bridge_core::enums::EntityKind;
use bridge_db::LocalStore;
use bridge_rpc::Connector;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::reconciler::{InvoiceLinks, Reconciler, SubscriptionLinks};
use crate::retry::RetryPolicy;

/// An item that failed during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub local_id: String,
    pub error: String,
    pub retryable: bool,
}

/// Outcome of a batch sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub kind: EntityKind,
    pub tenant_id: String,
    /// `(local_id, remote_id)` for every item that is now mapped.
    pub succeeded: Vec<(String, RemoteId)>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    fn new(kind: EntityKind, tenant_id: &str) -> Self {
        Self {
            kind,
            tenant_id: tenant_id.to_string(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Local ids of the failed items, in batch order.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.local_id.clone()).collect()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Entry point for syncing one tenant's local entities to its ERP.
///
/// Ensures are serialized per local id, so concurrent calls and batch items
/// that share a customer or plan never create a remote record twice.
pub struct SyncOrchestrator {
    store: Arc<dyn LocalStore>,
    reconciler: Reconciler,
    concurrency: usize,
    retry: RetryPolicy,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, connector: Arc<Connector>, config: &SyncConfig) -> Self {
        Self {
            store,
            reconciler: Reconciler::new(connector),
            concurrency: config.concurrency.max(1),
            retry: RetryPolicy::from_config(config),
            gates: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Map a customer to a remote partner.
    ///
    /// # Errors
    ///
    /// [`SyncError::Store`] if the customer cannot be read or the mapping
    /// cannot be persisted; [`SyncError::Reconciliation`] on remote failure.
    pub async fn sync_customer_to_remote(&self, customer_id: &str) -> Result<RemoteId, SyncError> {
        self.ensure_customer(customer_id).await
    }

    /// Map a plan to a remote product.
    ///
    /// # Errors
    ///
    /// Same as [`Self::sync_customer_to_remote`].
    pub async fn sync_plan_to_remote(&self, plan_id: &str) -> Result<RemoteId, SyncError> {
        self.ensure_plan(plan_id).await
    }

    /// Map a membership to a remote subscription, syncing its customer and
    /// plan first.
    ///
    /// # Errors
    ///
    /// [`SyncError::DependencyResolution`] if the customer or plan still has
    /// no stored remote id after being synced, [`SyncError::TenantMismatch`]
    /// if either belongs to another tenant, plus the errors of
    /// [`Self::sync_customer_to_remote`].
    pub async fn sync_membership_to_remote(
        &self,
        membership_id: &str,
    ) -> Result<RemoteId, SyncError> {
        let membership = self.store.membership(membership_id).await?;
        if let Some(remote_id) = membership.remote_subscription_id {
            return Ok(remote_id);
        }
        self.serialized(membership_id, self.create_membership(membership_id))
            .await
    }

    /// Map an invoice to a posted remote invoice, syncing its customer first.
    ///
    /// # Errors
    ///
    /// [`SyncError::DependencyResolution`] if the customer still has no
    /// stored remote id after being synced, [`SyncError::TenantMismatch`] if
    /// it belongs to another tenant, plus the errors of
    /// [`Self::sync_customer_to_remote`].
    pub async fn sync_invoice_to_remote(&self, invoice_id: &str) -> Result<RemoteId, SyncError> {
        let invoice = self.store.invoice(invoice_id).await?;
        if let Some(remote_id) = invoice.remote_invoice_id {
            return Ok(remote_id);
        }
        self.serialized(invoice_id, self.create_invoice(invoice_id))
            .await
    }

    /// Sync every plan of `tenant_id`.
    ///
    /// # Errors
    ///
    /// Only if the plans cannot be listed; per-item failures go in the report.
    pub async fn sync_all_plans(&self, tenant_id: &str) -> Result<BatchReport, SyncError> {
        let ids = self
            .store
            .plans_for_tenant(tenant_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        Ok(self.run_batch(EntityKind::Product, tenant_id, ids).await)
    }

    /// Sync every customer of `tenant_id`.
    ///
    /// # Errors
    ///
    /// Only if the customers cannot be listed.
    pub async fn sync_all_customers(&self, tenant_id: &str) -> Result<BatchReport, SyncError> {
        let ids = self
            .store
            .customers_for_tenant(tenant_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        Ok(self.run_batch(EntityKind::Partner, tenant_id, ids).await)
    }

    /// Sync every membership of `tenant_id`.
    ///
    /// # Errors
    ///
    /// Only if the memberships cannot be listed.
    pub async fn sync_all_memberships(&self, tenant_id: &str) -> Result<BatchReport, SyncError> {
        let ids = self
            .store
            .memberships_for_tenant(tenant_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
        Ok(self.run_batch(EntityKind::Subscription, tenant_id, ids).await)
    }

    /// Sync the given plans as one batch.
    pub async fn sync_plans(&self, tenant_id: &str, ids: Vec<String>) -> BatchReport {
        self.run_batch(EntityKind::Product, tenant_id, ids).await
    }

    /// Sync the given customers as one batch.
    pub async fn sync_customers(&self, tenant_id: &str, ids: Vec<String>) -> BatchReport {
        self.run_batch(EntityKind::Partner, tenant_id, ids).await
    }

    /// Sync the given memberships as one batch.
    pub async fn sync_memberships(&self, tenant_id: &str, ids: Vec<String>) -> BatchReport {
        self.run_batch(EntityKind::Subscription, tenant_id, ids).await
    }

    /// Re-run only the items that failed in `report`.
    pub async fn retry_failed(&self, report: &BatchReport) -> BatchReport {
        self.run_batch(report.kind, &report.tenant_id, report.failed_ids())
            .await
    }

    /// Run `work` while holding the gate for `local_id`.
    ///
    /// Gates are per orchestrator. An entry is dropped from the map once no
    /// other task holds or waits on it.
    async fn serialized<T>(&self, local_id: &str, work: impl Future<Output = T>) -> T {
        let gate = Arc::clone(
            self.gates
                .lock()
                .await
                .entry(local_id.to_string())
                .or_default(),
        );
        let outcome = {
            let _guard = gate.lock().await;
            work.await
        };

        let mut gates = self.gates.lock().await;
        let idle = gates
            .get(local_id)
            .is_some_and(|held| Arc::ptr_eq(held, &gate) && Arc::strong_count(&gate) == 2);
        if idle {
            gates.remove(local_id);
        }
        outcome
    }

    #[cfg(test)]
    async fn open_gates(&self) -> usize {
        self.gates.lock().await.len()
    }

    async fn ensure_customer(&self, customer_id: &str) -> Result<RemoteId, SyncError> {
        let customer = self.store.customer(customer_id).await?;
        if let Some(remote_id) = customer.remote_customer_id {
            return Ok(remote_id);
        }
        self.serialized(customer_id, self.create_customer(customer_id))
            .await
    }

    async fn create_customer(&self, customer_id: &str) -> Result<RemoteId, SyncError> {
        // Another item may have mapped it while we waited.
        let customer = self.store.customer(customer_id).await?;
        if let Some(remote_id) = customer.remote_customer_id {
            return Ok(remote_id);
        }
        let ensured = self.reconciler.ensure(&customer, &()).await?;
        self.store
            .set_customer_remote_id(&customer.id, ensured.remote_id)
            .await?;
        Ok(ensured.remote_id)
    }

    async fn ensure_plan(&self, plan_id: &str) -> Result<RemoteId, SyncError> {
        let plan = self.store.plan(plan_id).await?;
        if let Some(remote_id) = plan.remote_product_id {
            return Ok(remote_id);
        }
        self.serialized(plan_id, self.create_plan(plan_id)).await
    }

    async fn create_plan(&self, plan_id: &str) -> Result<RemoteId, SyncError> {
        let plan = self.store.plan(plan_id).await?;
        if let Some(remote_id) = plan.remote_product_id {
            return Ok(remote_id);
        }
        let ensured = self.reconciler.ensure(&plan, &()).await?;
        self.store
            .set_plan_remote_id(&plan.id, ensured.remote_id)
            .await?;
        Ok(ensured.remote_id)
    }

    /// Runs under the membership's gate; takes customer and plan gates inside it.
    async fn create_membership(&self, membership_id: &str) -> Result<RemoteId, SyncError> {
        let membership = self.store.membership(membership_id).await?;
        if let Some(remote_id) = membership.remote_subscription_id {
            return Ok(remote_id);
        }

        let customer = self.store.customer(&membership.customer_id).await?;
        same_tenant(&membership.tenant_id, EntityKind::Partner, &customer.id, &customer.tenant_id)?;
        let plan = self.store.plan(&membership.plan_id).await?;
        same_tenant(&membership.tenant_id, EntityKind::Product, &plan.id, &plan.tenant_id)?;

        self.ensure_customer(&customer.id).await?;
        self.ensure_plan(&plan.id).await?;

        // Trust only what was persisted, not the ids returned above.
        let missing = |missing| SyncError::DependencyResolution {
            kind: EntityKind::Subscription,
            local_id: membership.id.clone(),
            missing,
        };
        let partner = self
            .store
            .customer(&customer.id)
            .await?
            .remote_customer_id
            .ok_or_else(|| missing(EntityKind::Partner))?;
        let product = self
            .store
            .plan(&plan.id)
            .await?
            .remote_product_id
            .ok_or_else(|| missing(EntityKind::Product))?;

        let ensured = self
            .reconciler
            .ensure(&membership, &SubscriptionLinks { partner, product })
            .await?;
        self.store
            .set_membership_remote_id(&membership.id, ensured.remote_id)
            .await?;
        Ok(ensured.remote_id)
    }

    async fn create_invoice(&self, invoice_id: &str) -> Result<RemoteId, SyncError> {
        let invoice = self.store.invoice(invoice_id).await?;
        if let Some(remote_id) = invoice.remote_invoice_id {
            return Ok(remote_id);
        }

        let customer = self.store.customer(&invoice.customer_id).await?;
        same_tenant(&invoice.tenant_id, EntityKind::Partner, &customer.id, &customer.tenant_id)?;

        self.ensure_customer(&customer.id).await?;
        let partner = self
            .store
            .customer(&customer.id)
            .await?
            .remote_customer_id
            .ok_or_else(|| SyncError::DependencyResolution {
                kind: EntityKind::Invoice,
                local_id: invoice.id.clone(),
                missing: EntityKind::Partner,
            })?;

        let ensured = self
            .reconciler
            .ensure(&invoice, &InvoiceLinks { partner })
            .await?;
        self.store
            .set_invoice_remote_id(&invoice.id, ensured.remote_id)
            .await?;
        Ok(ensured.remote_id)
    }

    async fn tenant_of(&self, kind: EntityKind, local_id: &str) -> Result<String, SyncError> {
        Ok(match kind {
            EntityKind::Partner => self.store.customer(local_id).await?.tenant_id,
            EntityKind::Product => self.store.plan(local_id).await?.tenant_id,
            EntityKind::Subscription => self.store.membership(local_id).await?.tenant_id,
            EntityKind::Invoice => self.store.invoice(local_id).await?.tenant_id,
        })
    }

    async fn sync_one(
        &self,
        kind: EntityKind,
        tenant_id: &str,
        local_id: &str,
    ) -> Result<RemoteId, SyncError> {
        let owner = self.tenant_of(kind, local_id).await?;
        same_tenant(tenant_id, kind, local_id, &owner)?;
        match kind {
            EntityKind::Partner => self.sync_customer_to_remote(local_id).await,
            EntityKind::Product => self.sync_plan_to_remote(local_id).await,
            EntityKind::Subscription => self.sync_membership_to_remote(local_id).await,
            EntityKind::Invoice => self.sync_invoice_to_remote(local_id).await,
        }
    }

    async fn sync_with_retry(
        &self,
        kind: EntityKind,
        tenant_id: &str,
        local_id: &str,
    ) -> Result<RemoteId, SyncError> {
        let mut attempt = 1;
        loop {
            match self.sync_one(kind, tenant_id, local_id).await {
                Err(e) if e.is_retryable() && self.retry.allows_retry_after(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::debug!(%kind, local_id, attempt, ?delay, error = %e, "retrying batch item");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn run_batch(&self, kind: EntityKind, tenant_id: &str, ids: Vec<String>) -> BatchReport {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

        let outcomes: Vec<(String, Result<RemoteId, SyncError>)> = futures::stream::iter(ids)
            .map(|local_id| async move {
                let outcome = self.sync_with_retry(kind, tenant_id, &local_id).await;
                (local_id, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport::new(kind, tenant_id);
        for (local_id, outcome) in outcomes {
            match outcome {
                Ok(remote_id) => report.succeeded.push((local_id, remote_id)),
                Err(e) => {
                    tracing::warn!(%kind, tenant_id, local_id = %local_id, error = %e, "batch item failed");
                    report.failed.push(BatchFailure {
                        retryable: e.is_retryable(),
                        error: e.to_string(),
                        local_id,
                    });
                }
            }
        }

        tracing::info!(
            %kind,
            tenant_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch sync finished"
        );
        report
    }
}

fn same_tenant(
    expected: &str,
    kind: EntityKind,
    local_id: &str,
    actual: &str,
) -> Result<(), SyncError> {
    if expected == actual {
        return Ok(());
    }
    Err(SyncError::TenantMismatch {
        kind,
        local_id: local_id.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bridge_db::LedgerService;
    use bridge_rpc::{ConnectorError, Credentials, RpcCall, RpcTransport, Session};
    use serde_json::Value;

    use super::*;

    struct Offline;

    #[async_trait]
    impl RpcTransport for Offline {
        async fn login(&self, _credentials: &Credentials) -> Result<Session, ConnectorError> {
            Err(ConnectorError::Authentication("offline".into()))
        }

        async fn execute(&self, _session: &Session, _call: &RpcCall) -> Result<Value, ConnectorError> {
            Err(ConnectorError::Authentication("offline".into()))
        }
    }

    async fn orchestrator() -> SyncOrchestrator {
        let store = Arc::new(LedgerService::new_local(":memory:").await.unwrap());
        let connector = Arc::new(Connector::new(
            Arc::new(Offline),
            Credentials::Password {
                database: "acme".into(),
                login: "bridge".into(),
                password: "pw".into(),
            },
        ));
        SyncOrchestrator::new(store, connector, &SyncConfig::default())
    }

    #[tokio::test]
    async fn serialized_work_never_overlaps() {
        let orchestrator = orchestrator().await;
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (running, peak) = (&running, &peak);
        let work = || async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            running.fetch_sub(1, Ordering::SeqCst);
        };

        tokio::join!(
            orchestrator.serialized("inv-1", work()),
            orchestrator.serialized("inv-1", work()),
            orchestrator.serialized("inv-1", work()),
        );

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn released_gates_are_dropped() {
        let orchestrator = orchestrator().await;

        tokio::join!(
            orchestrator.serialized("cus-1", tokio::task::yield_now()),
            orchestrator.serialized("cus-1", tokio::task::yield_now()),
            orchestrator.serialized("pln-1", tokio::task::yield_now()),
        );

        assert_eq!(orchestrator.open_gates().await, 0);
    }
}
