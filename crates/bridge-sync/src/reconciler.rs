//! The ensure pattern: find a remote record by external reference, or create it.
//!
//! Each local entity kind describes its remote counterpart once through
//! [`RemoteCounterpart`]. [`Reconciler::ensure`] is the single routine that
//! performs lookup, create, and the optional post-create action for all of
//! them.

use std::sync::Arc;

use bridge_core::RemoteId;
use bridge_core::entities::{Customer, Invoice, Membership, Plan};
use bridge_core::enums::EntityKind;
use bridge_rpc::fields::{IdOnly, domain_eq};
use bridge_rpc::{Connector, ConnectorError, SearchOptions};
use serde_json::{Map, Value, json};

use crate::error::SyncError;

/// How a local entity maps onto a remote model.
pub trait RemoteCounterpart: Send + Sync {
    const KIND: EntityKind;
    /// Remote model name, e.g. `res.partner`.
    const MODEL: &'static str;
    /// Remote field holding the local id.
    const EXTERNAL_REF_FIELD: &'static str;
    /// Method called on a freshly created record, never on a found one.
    const POST_CREATE: Option<&'static str> = None;

    /// Remote ids of prerequisites the record links to.
    type Links: Sync;

    fn local_id(&self) -> &str;

    /// Field values for `create`, excluding the external reference.
    fn remote_values(&self, links: &Self::Links) -> Map<String, Value>;
}

/// Remote prerequisites of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionLinks {
    pub partner: RemoteId,
    pub product: RemoteId,
}

/// Remote prerequisite of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceLinks {
    pub partner: RemoteId,
}

/// Result of an ensure call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ensured {
    pub remote_id: RemoteId,
    /// `false` when an existing record was found by external reference.
    pub created: bool,
}

/// Convert minor units to the ERP's decimal amount.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Convert an ERP decimal amount to minor units.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

impl RemoteCounterpart for Customer {
    const KIND: EntityKind = EntityKind::Partner;
    const MODEL: &'static str = "res.partner";
    const EXTERNAL_REF_FIELD: &'static str = "ref";
    type Links = ();

    fn local_id(&self) -> &str {
        &self.id
    }

    fn remote_values(&self, _: &()) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("name".into(), json!(self.name));
        values.insert("email".into(), json!(self.email));
        if let Some(phone) = &self.phone {
            values.insert("phone".into(), json!(phone));
        }
        values.insert("customer_rank".into(), json!(1));
        values
    }
}

impl RemoteCounterpart for Plan {
    const KIND: EntityKind = EntityKind::Product;
    const MODEL: &'static str = "product.product";
    const EXTERNAL_REF_FIELD: &'static str = "default_code";
    type Links = ();

    fn local_id(&self) -> &str {
        &self.id
    }

    fn remote_values(&self, _: &()) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("name".into(), json!(self.name));
        values.insert("type".into(), json!("service"));
        values.insert("list_price".into(), json!(cents_to_amount(self.price_cents)));
        values.insert("recurring_invoice".into(), json!(true));
        values.insert("recurring_rule_type".into(), json!(self.cadence.as_str()));
        values
    }
}

impl RemoteCounterpart for Membership {
    const KIND: EntityKind = EntityKind::Subscription;
    const MODEL: &'static str = "sale.subscription";
    const EXTERNAL_REF_FIELD: &'static str = "code";
    type Links = SubscriptionLinks;

    fn local_id(&self) -> &str {
        &self.id
    }

    fn remote_values(&self, links: &SubscriptionLinks) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("partner_id".into(), json!(links.partner));
        values.insert(
            "recurring_invoice_line_ids".into(),
            json!([[0, 0, {"product_id": links.product, "quantity": 1.0}]]),
        );
        values
    }
}

impl RemoteCounterpart for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;
    const MODEL: &'static str = "account.move";
    const EXTERNAL_REF_FIELD: &'static str = "ref";
    const POST_CREATE: Option<&'static str> = Some("action_post");
    type Links = InvoiceLinks;

    fn local_id(&self) -> &str {
        &self.id
    }

    fn remote_values(&self, links: &InvoiceLinks) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("move_type".into(), json!("out_invoice"));
        values.insert("partner_id".into(), json!(links.partner));
        values.insert(
            "invoice_line_ids".into(),
            json!([[0, 0, {
                "name": self.description,
                "quantity": 1.0,
                "price_unit": cents_to_amount(self.amount_cents),
            }]]),
        );
        values
    }
}

/// Runs the ensure pattern against one ERP connection.
#[derive(Clone)]
pub struct Reconciler {
    connector: Arc<Connector>,
}

impl Reconciler {
    #[must_use]
    pub const fn new(connector: Arc<Connector>) -> Self {
        Self { connector }
    }

    /// Return the remote record for `entity`, creating it if none exists.
    ///
    /// The caller must persist the returned id onto the local entity.
    ///
    /// # Errors
    ///
    /// [`SyncError::Reconciliation`] tagged with the entity kind and local id
    /// if any remote call fails.
    pub async fn ensure<E: RemoteCounterpart>(
        &self,
        entity: &E,
        links: &E::Links,
    ) -> Result<Ensured, SyncError> {
        let local_id = entity.local_id();
        self.ensure_inner(entity, links)
            .await
            .map_err(|source| SyncError::Reconciliation {
                kind: E::KIND,
                local_id: local_id.to_string(),
                source,
            })
    }

    /// Look up the remote record whose external reference is `local_id`.
    ///
    /// # Errors
    ///
    /// Propagates connector errors.
    pub async fn lookup<E: RemoteCounterpart>(
        &self,
        local_id: &str,
    ) -> Result<Option<RemoteId>, ConnectorError> {
        let matches: Vec<IdOnly> = self
            .connector
            .search_read(
                E::MODEL,
                domain_eq(E::EXTERNAL_REF_FIELD, local_id),
                &["id"],
                SearchOptions {
                    limit: Some(2),
                    order: Some("id asc".into()),
                },
            )
            .await?;

        if matches.len() > 1 {
            tracing::warn!(
                kind = %E::KIND,
                local_id,
                model = E::MODEL,
                "multiple remote records share one external reference; using the oldest"
            );
        }
        Ok(matches.first().map(|m| m.id))
    }

    async fn ensure_inner<E: RemoteCounterpart>(
        &self,
        entity: &E,
        links: &E::Links,
    ) -> Result<Ensured, ConnectorError> {
        let local_id = entity.local_id();

        if let Some(remote_id) = self.lookup::<E>(local_id).await? {
            tracing::debug!(kind = %E::KIND, local_id, %remote_id, "remote record already exists");
            return Ok(Ensured {
                remote_id,
                created: false,
            });
        }

        let mut values = entity.remote_values(links);
        values.insert(E::EXTERNAL_REF_FIELD.into(), json!(local_id));
        let remote_id = self.connector.create(E::MODEL, values).await?;
        tracing::info!(kind = %E::KIND, local_id, %remote_id, "created remote record");

        if let Some(method) = E::POST_CREATE {
            self.connector
                .call_method(E::MODEL, method, &[remote_id], Map::new())
                .await?;
            tracing::debug!(kind = %E::KIND, %remote_id, method, "post-create action applied");
        }

        Ok(Ensured {
            remote_id,
            created: true,
        })
    }
}
