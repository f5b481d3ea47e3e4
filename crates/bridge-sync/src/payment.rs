//! Hosted payment links and transaction status.
//!
//! The broker talks to the connector directly and never writes local state.
//! Transaction states are driven by the ERP; callers poll
//! [`PaymentBroker::transaction_status`] and react to terminal states.

use std::sync::Arc;

use bridge_core::RemoteId;
use bridge_core::errors::CoreError;
use bridge_core::entities::{Invoice, Membership};
use bridge_core::enums::{PaymentDocument, TransactionState};
use bridge_rpc::fields::{IdOnly, domain_eq, many2one};
use bridge_rpc::{Connector, ConnectorError, SearchOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::PaymentError;
use crate::reconciler::{RemoteCounterpart, amount_to_cents, cents_to_amount};

const TRANSACTION_MODEL: &str = "payment.transaction";
const ACQUIRER_MODEL: &str = "payment.acquirer";
const CURRENCY_MODEL: &str = "res.currency";

const TRANSACTION_FIELDS: &[&str] = &[
    "reference",
    "state",
    "amount",
    "currency_id",
    "partner_id",
    "acquirer_id",
];

/// Everything needed to open a hosted checkout for one ERP document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLinkRequest {
    pub document: PaymentDocument,
    /// Remote id of the subscription or invoice being paid.
    pub document_id: RemoteId,
    pub amount_cents: i64,
    /// ISO 4217 code, e.g. `EUR`.
    pub currency: String,
    /// Caller-chosen transaction reference; also the status lookup key.
    pub external_ref: String,
    pub return_url: String,
    pub cancel_url: String,
    /// Acquirer to route through; the first enabled one when `None`.
    pub acquirer_id: Option<RemoteId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLink {
    pub checkout_url: String,
    pub external_ref: String,
    pub transaction_id: RemoteId,
}

/// Current ERP view of a payment transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionStatus {
    pub transaction_id: RemoteId,
    pub external_ref: String,
    pub state: TransactionState,
    pub amount_cents: i64,
    pub currency_id: Option<RemoteId>,
    pub partner_id: Option<RemoteId>,
    pub acquirer_id: Option<RemoteId>,
}

impl TransactionStatus {
    /// Compare against the state a poller saw last. Returns `true` if the
    /// state moved.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidTransition`] if the ERP reports a move the
    /// lifecycle forbids, such as leaving a terminal state.
    pub fn advanced_from(&self, previous: TransactionState) -> Result<bool, CoreError> {
        previous.check_transition(self.state, &self.external_ref)?;
        Ok(previous != self.state)
    }
}

/// A payment acquirer as listed by the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquirer {
    pub id: RemoteId,
    pub name: String,
    pub provider: String,
    pub state: String,
}

impl Acquirer {
    /// Live and sandbox acquirers can both take payments.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self.state.as_str(), "enabled" | "test")
    }
}

/// First usable acquirer in list order.
#[must_use]
pub fn select_acquirer(acquirers: &[Acquirer]) -> Option<&Acquirer> {
    acquirers.iter().find(|a| a.is_usable())
}

#[derive(Deserialize)]
struct DocumentPartner {
    #[serde(default, deserialize_with = "many2one")]
    partner_id: Option<RemoteId>,
}

#[derive(Deserialize)]
struct TransactionRow {
    id: RemoteId,
    reference: String,
    state: TransactionState,
    amount: f64,
    #[serde(default, deserialize_with = "many2one")]
    currency_id: Option<RemoteId>,
    #[serde(default, deserialize_with = "many2one")]
    partner_id: Option<RemoteId>,
    #[serde(default, deserialize_with = "many2one")]
    acquirer_id: Option<RemoteId>,
}

impl From<TransactionRow> for TransactionStatus {
    fn from(row: TransactionRow) -> Self {
        Self {
            transaction_id: row.id,
            external_ref: row.reference,
            state: row.state,
            amount_cents: amount_to_cents(row.amount),
            currency_id: row.currency_id,
            partner_id: row.partner_id,
            acquirer_id: row.acquirer_id,
        }
    }
}

const fn document_model(document: PaymentDocument) -> &'static str {
    match document {
        PaymentDocument::Subscription => <Membership as RemoteCounterpart>::MODEL,
        PaymentDocument::Invoice => <Invoice as RemoteCounterpart>::MODEL,
    }
}

/// Transaction field linking to the paid document.
const fn document_link_field(document: PaymentDocument) -> &'static str {
    match document {
        PaymentDocument::Subscription => "subscription_ids",
        PaymentDocument::Invoice => "invoice_ids",
    }
}

/// Creates payment transactions and reads their state.
#[derive(Clone)]
pub struct PaymentBroker {
    connector: Arc<Connector>,
}

impl PaymentBroker {
    #[must_use]
    pub const fn new(connector: Arc<Connector>) -> Self {
        Self { connector }
    }

    /// Create a remote transaction for a document and return its hosted
    /// checkout URL.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::UnknownCurrency`] if the currency code is not in the ERP
    /// - [`PaymentError::DocumentNotFound`] / [`PaymentError::DocumentWithoutPartner`]
    ///   if the document cannot be billed
    /// - [`PaymentError::NoAcquirerConfigured`] if no acquirer is given and none is enabled
    /// - [`PaymentError::Connector`] for any remote failure
    pub async fn create_payment_link(
        &self,
        request: PaymentLinkRequest,
    ) -> Result<PaymentLink, PaymentError> {
        let currency_id = self.currency_id(&request.currency).await?;
        let partner_id = self
            .document_partner(request.document, request.document_id)
            .await?;
        let acquirer_id = match request.acquirer_id {
            Some(id) => id,
            None => self.default_acquirer().await?,
        };

        let mut values = Map::new();
        values.insert("reference".into(), json!(request.external_ref));
        values.insert("amount".into(), json!(cents_to_amount(request.amount_cents)));
        values.insert("currency_id".into(), json!(currency_id));
        values.insert("partner_id".into(), json!(partner_id));
        values.insert("acquirer_id".into(), json!(acquirer_id));
        values.insert(
            document_link_field(request.document).into(),
            json!([[6, 0, [request.document_id]]]),
        );
        let transaction_id = self.connector.create(TRANSACTION_MODEL, values).await?;

        let mut kwargs = Map::new();
        kwargs.insert("return_url".into(), json!(request.return_url));
        kwargs.insert("cancel_url".into(), json!(request.cancel_url));
        let url = self
            .connector
            .call_method(TRANSACTION_MODEL, "get_checkout_url", &[transaction_id], kwargs)
            .await?;
        let checkout_url = match url {
            Value::String(url) => url,
            other => {
                return Err(ConnectorError::Protocol(format!(
                    "get_checkout_url returned {other} instead of a URL"
                ))
                .into());
            }
        };

        tracing::info!(
            document = %request.document,
            document_id = %request.document_id,
            %transaction_id,
            %acquirer_id,
            external_ref = %request.external_ref,
            "payment link created"
        );
        Ok(PaymentLink {
            checkout_url,
            external_ref: request.external_ref,
            transaction_id,
        })
    }

    /// Look up a transaction by its external reference.
    ///
    /// Returns `Ok(None)` when no transaction carries that reference yet.
    ///
    /// # Errors
    ///
    /// [`PaymentError::Connector`] for any remote failure.
    pub async fn transaction_status(
        &self,
        external_ref: &str,
    ) -> Result<Option<TransactionStatus>, PaymentError> {
        let rows: Vec<TransactionRow> = self
            .connector
            .search_read(
                TRANSACTION_MODEL,
                domain_eq("reference", external_ref),
                TRANSACTION_FIELDS,
                SearchOptions {
                    limit: Some(1),
                    order: Some("id desc".into()),
                },
            )
            .await?;
        Ok(rows.into_iter().next().map(TransactionStatus::from))
    }

    /// Acquirers in the ERP's order, usable or not.
    ///
    /// # Errors
    ///
    /// [`PaymentError::Connector`] for any remote failure.
    pub async fn acquirers(&self) -> Result<Vec<Acquirer>, PaymentError> {
        Ok(self
            .connector
            .search_read(
                ACQUIRER_MODEL,
                json!([]),
                &["id", "name", "provider", "state"],
                SearchOptions {
                    limit: None,
                    order: Some("sequence asc, id asc".into()),
                },
            )
            .await?)
    }

    async fn default_acquirer(&self) -> Result<RemoteId, PaymentError> {
        let acquirers = self.acquirers().await?;
        select_acquirer(&acquirers)
            .map(|a| a.id)
            .ok_or(PaymentError::NoAcquirerConfigured)
    }

    async fn currency_id(&self, code: &str) -> Result<RemoteId, PaymentError> {
        let matches: Vec<IdOnly> = self
            .connector
            .search_read(
                CURRENCY_MODEL,
                domain_eq("name", code),
                &["id"],
                SearchOptions {
                    limit: Some(1),
                    order: None,
                },
            )
            .await?;
        matches
            .first()
            .map(|m| m.id)
            .ok_or_else(|| PaymentError::UnknownCurrency(code.to_string()))
    }

    async fn document_partner(
        &self,
        document: PaymentDocument,
        id: RemoteId,
    ) -> Result<RemoteId, PaymentError> {
        let record: Option<DocumentPartner> = self
            .connector
            .read_one(document_model(document), id, &["partner_id"])
            .await?;
        record
            .ok_or(PaymentError::DocumentNotFound { document, id })?
            .partner_id
            .ok_or(PaymentError::DocumentWithoutPartner { document, id })
    }
}
