//! In-memory ERP and store doubles shared by the sync integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_config::SyncConfig;
use bridge_core::RemoteId;
use bridge_core::entities::{Customer, Invoice, Membership, Plan};
use bridge_db::error::DatabaseError;
use bridge_db::{LedgerService, LocalStore};
use bridge_rpc::{Connector, ConnectorError, Credentials, RpcCall, RpcTransport, Session};
use bridge_sync::SyncOrchestrator;
use serde_json::{Map, Value, json};

pub const TENANT: &str = "acme";

/// A failure injected into `create` calls whose values mention `needle`.
struct Fault {
    model: String,
    needle: String,
    /// `None` fails forever with a remote error; `Some(n)` fails the next
    /// `n` attempts with a transport error.
    transient_left: Option<usize>,
}

/// Minimal ERP: records live in memory, every call is recorded.
#[derive(Default)]
pub struct FakeErp {
    records: Mutex<BTreeMap<String, Vec<Map<String, Value>>>>,
    calls: Mutex<Vec<(String, String)>>,
    faults: Mutex<Vec<Fault>>,
    next_id: AtomicI64,
    pub logins: AtomicUsize,
}

impl FakeErp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(100),
            ..Self::default()
        })
    }

    /// Insert a record directly, bypassing the call log.
    pub fn seed(&self, model: &str, values: Value) -> RemoteId {
        let Value::Object(mut values) = values else {
            panic!("seed values must be an object");
        };
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        values.insert("id".into(), json!(id));
        self.records
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push(values);
        RemoteId(id)
    }

    pub fn records(&self, model: &str) -> Vec<Map<String, Value>> {
        self.records
            .lock()
            .unwrap()
            .get(model)
            .cloned()
            .unwrap_or_default()
    }

    pub fn record(&self, model: &str, id: RemoteId) -> Option<Map<String, Value>> {
        self.records(model)
            .into_iter()
            .find(|r| r.get("id") == Some(&json!(id.get())))
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, model: &str, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(m, f)| m == model && f == method)
            .count()
    }

    /// Every `create` on `model` mentioning `needle` fails with a remote error.
    pub fn reject_create(&self, model: &str, needle: &str) {
        self.faults.lock().unwrap().push(Fault {
            model: model.into(),
            needle: needle.into(),
            transient_left: None,
        });
    }

    /// The next `times` creates on `model` mentioning `needle` time out.
    pub fn flake_create(&self, model: &str, needle: &str, times: usize) {
        self.faults.lock().unwrap().push(Fault {
            model: model.into(),
            needle: needle.into(),
            transient_left: Some(times),
        });
    }

    fn injected_fault(&self, model: &str, values: &Map<String, Value>) -> Option<ConnectorError> {
        let mut faults = self.faults.lock().unwrap();
        let fault = faults.iter_mut().find(|f| {
            f.model == model
                && values.values().any(|v| v.as_str() == Some(f.needle.as_str()))
                && f.transient_left != Some(0)
        })?;
        match fault.transient_left.as_mut() {
            None => Some(ConnectorError::Rpc {
                name: "odoo.exceptions.ValidationError".into(),
                message: format!("rejected {}", fault.needle),
            }),
            Some(left) => {
                *left -= 1;
                Some(ConnectorError::Transport {
                    message: "operation timed out".into(),
                    timed_out: true,
                })
            }
        }
    }

    fn search_read(&self, model: &str, call: &RpcCall) -> Value {
        let domain = call.args.first().cloned().unwrap_or_else(|| json!([]));
        let conditions: Vec<(String, Value)> = domain
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|c| {
                let c = c.as_array()?;
                Some((c.first()?.as_str()?.to_string(), c.get(2)?.clone()))
            })
            .collect();
        let limit = call
            .kwargs
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap());

        let rows: Vec<Value> = self
            .records(model)
            .into_iter()
            .filter(|r| conditions.iter().all(|(f, v)| r.get(f) == Some(v)))
            .take(limit)
            .map(Value::Object)
            .collect();
        Value::Array(rows)
    }

    fn read(&self, model: &str, call: &RpcCall) -> Value {
        let ids: Vec<Value> = call
            .args
            .first()
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let rows: Vec<Value> = self
            .records(model)
            .into_iter()
            .filter(|r| r.get("id").is_some_and(|id| ids.contains(id)))
            .map(Value::Object)
            .collect();
        Value::Array(rows)
    }

    fn create(&self, model: &str, call: &RpcCall) -> Result<Value, ConnectorError> {
        let mut values = call
            .args
            .first()
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| ConnectorError::Protocol("create without values".into()))?;
        if let Some(err) = self.injected_fault(model, &values) {
            return Err(err);
        }
        if model == "account.move" || model == "payment.transaction" {
            values.insert("state".into(), json!("draft"));
        }
        Ok(json!(self.seed(model, Value::Object(values)).get()))
    }

    fn set_state(&self, model: &str, call: &RpcCall, state: &str) -> Value {
        let ids = call.args.first().cloned().unwrap_or_default();
        let mut records = self.records.lock().unwrap();
        for record in records.entry(model.to_string()).or_default() {
            if ids
                .as_array()
                .is_some_and(|ids| record.get("id").is_some_and(|id| ids.contains(id)))
            {
                record.insert("state".into(), json!(state));
            }
        }
        json!(true)
    }
}

#[async_trait]
impl RpcTransport for FakeErp {
    async fn login(&self, _credentials: &Credentials) -> Result<Session, ConnectorError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(Session::new("fake-session".into(), 2))
    }

    async fn execute(&self, _session: &Session, call: &RpcCall) -> Result<Value, ConnectorError> {
        self.calls
            .lock()
            .unwrap()
            .push((call.model.clone(), call.method.clone()));
        tokio::task::yield_now().await;

        match call.method.as_str() {
            "search_read" => Ok(self.search_read(&call.model, call)),
            "read" => Ok(self.read(&call.model, call)),
            "create" => self.create(&call.model, call),
            "action_post" => Ok(self.set_state(&call.model, call, "posted")),
            "get_checkout_url" => {
                let id = call.args.first().and_then(|ids| ids.get(0)).cloned();
                Ok(json!(format!("https://erp.test/pay/{}", id.unwrap_or_default())))
            }
            other => Err(ConnectorError::Rpc {
                name: "AttributeError".into(),
                message: format!("unknown method {other}"),
            }),
        }
    }
}

pub fn connector(erp: &Arc<FakeErp>) -> Arc<Connector> {
    Arc::new(Connector::new(
        erp.clone(),
        Credentials::Password {
            database: "acme".into(),
            login: "bridge".into(),
            password: "pw".into(),
        },
    ))
}

pub async fn ledger() -> Arc<LedgerService> {
    Arc::new(LedgerService::new_local(":memory:").await.unwrap())
}

pub struct Harness {
    pub erp: Arc<FakeErp>,
    pub ledger: Arc<LedgerService>,
    pub orchestrator: SyncOrchestrator,
}

pub async fn harness() -> Harness {
    harness_with(&SyncConfig::default()).await
}

pub async fn harness_with(config: &SyncConfig) -> Harness {
    let erp = FakeErp::new();
    let ledger = ledger().await;
    let orchestrator = SyncOrchestrator::new(ledger.clone(), connector(&erp), config);
    Harness {
        erp,
        ledger,
        orchestrator,
    }
}

pub async fn seed_customer(ledger: &LedgerService, name: &str) -> Customer {
    ledger
        .create_customer(TENANT, name, &format!("{}@example.com", name.to_lowercase()), None)
        .await
        .unwrap()
}

pub async fn seed_plan(ledger: &LedgerService, name: &str) -> Plan {
    ledger
        .create_plan(TENANT, name, 2_900, bridge_core::enums::BillingCadence::Monthly)
        .await
        .unwrap()
}

/// Store that acknowledges customer write-backs without persisting them.
pub struct ForgetfulStore {
    pub inner: Arc<LedgerService>,
}

#[async_trait]
impl LocalStore for ForgetfulStore {
    async fn customer(&self, id: &str) -> Result<Customer, DatabaseError> {
        self.inner.customer(id).await
    }

    async fn plan(&self, id: &str) -> Result<Plan, DatabaseError> {
        self.inner.plan(id).await
    }

    async fn membership(&self, id: &str) -> Result<Membership, DatabaseError> {
        self.inner.membership(id).await
    }

    async fn invoice(&self, id: &str) -> Result<Invoice, DatabaseError> {
        self.inner.invoice(id).await
    }

    async fn customers_for_tenant(&self, tenant_id: &str) -> Result<Vec<Customer>, DatabaseError> {
        self.inner.customers_for_tenant(tenant_id).await
    }

    async fn plans_for_tenant(&self, tenant_id: &str) -> Result<Vec<Plan>, DatabaseError> {
        self.inner.plans_for_tenant(tenant_id).await
    }

    async fn memberships_for_tenant(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<Membership>, DatabaseError> {
        self.inner.memberships_for_tenant(tenant_id).await
    }

    async fn set_customer_remote_id(
        &self,
        _id: &str,
        _remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn set_plan_remote_id(&self, id: &str, remote_id: RemoteId) -> Result<(), DatabaseError> {
        LocalStore::set_plan_remote_id(self.inner.as_ref(), id, remote_id).await
    }

    async fn set_membership_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        LocalStore::set_membership_remote_id(self.inner.as_ref(), id, remote_id).await
    }

    async fn set_invoice_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        LocalStore::set_invoice_remote_id(self.inner.as_ref(), id, remote_id).await
    }
}
