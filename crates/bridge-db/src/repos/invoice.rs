//! Invoice repository.

use bridge_core::RemoteId;
use bridge_core::entities::Invoice;
use bridge_core::ids::PREFIX_INVOICE;
use chrono::Utc;

use crate::error::DatabaseError;
use crate::helpers::{get_remote_id, parse_datetime};
use crate::service::LedgerService;

const SELECT_COLS: &str = "id, tenant_id, customer_id, amount_cents, description, \
     remote_invoice_id, created_at, updated_at";

fn row_to_invoice(row: &libsql::Row) -> Result<Invoice, DatabaseError> {
    Ok(Invoice {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        customer_id: row.get(2)?,
        amount_cents: row.get(3)?,
        description: row.get(4)?,
        remote_invoice_id: get_remote_id(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl LedgerService {
    pub async fn create_invoice(
        &self,
        tenant_id: &str,
        customer_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<Invoice, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_INVOICE).await?;

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO invoices ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7)"
                ),
                libsql::params![
                    id.as_str(),
                    tenant_id,
                    customer_id,
                    amount_cents,
                    description,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Invoice {
            id,
            tenant_id: tenant_id.to_string(),
            customer_id: customer_id.to_string(),
            amount_cents,
            description: description.to_string(),
            remote_invoice_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_invoice(&self, id: &str) -> Result<Invoice, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM invoices WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_invoice(&row)
    }

    pub async fn set_invoice_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        self.set_remote_id("invoices", "remote_invoice_id", id, remote_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn create_and_get_invoice() {
        let svc = test_service().await;
        let customer = svc
            .create_customer("acme", "Ada", "ada@example.com", None)
            .await
            .unwrap();
        let invoice = svc
            .create_invoice("acme", &customer.id, 2_500, "Onboarding")
            .await
            .unwrap();
        assert!(invoice.id.starts_with("inv-"));

        let fetched = svc.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(fetched, invoice);
    }
}
