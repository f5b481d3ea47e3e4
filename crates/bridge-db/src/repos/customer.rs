//! Customer repository.

use bridge_core::RemoteId;
use bridge_core::entities::Customer;
use bridge_core::ids::PREFIX_CUSTOMER;
use chrono::Utc;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_remote_id, parse_datetime};
use crate::service::LedgerService;

const SELECT_COLS: &str =
    "id, tenant_id, name, email, phone, remote_customer_id, created_at, updated_at";

fn row_to_customer(row: &libsql::Row) -> Result<Customer, DatabaseError> {
    Ok(Customer {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: get_opt_string(row, 4)?,
        remote_customer_id: get_remote_id(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl LedgerService {
    pub async fn create_customer(
        &self,
        tenant_id: &str,
        name: &str,
        email: &str,
        phone: Option<&str>,
    ) -> Result<Customer, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_CUSTOMER).await?;

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO customers ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7)"
                ),
                libsql::params![
                    id.as_str(),
                    tenant_id,
                    name,
                    email,
                    phone,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Customer {
            id,
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(String::from),
            remote_customer_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_customer(&self, id: &str) -> Result<Customer, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM customers WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_customer(&row)
    }

    pub async fn list_customers(&self, tenant_id: &str) -> Result<Vec<Customer>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM customers WHERE tenant_id = ?1
                     ORDER BY created_at, id"
                ),
                [tenant_id],
            )
            .await?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next().await? {
            customers.push(row_to_customer(&row)?);
        }
        Ok(customers)
    }

    pub async fn set_customer_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        self.set_remote_id("customers", "remote_customer_id", id, remote_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn create_and_get_customer() {
        let svc = test_service().await;
        let created = svc
            .create_customer("acme", "Ada", "ada@example.com", Some("+44 20"))
            .await
            .unwrap();
        assert!(created.id.starts_with("cus-"));

        let fetched = svc.get_customer(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.remote_customer_id, None);
    }

    #[tokio::test]
    async fn get_missing_customer_is_no_result() {
        let svc = test_service().await;
        let err = svc.get_customer("cus-00000000").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NoResult));
    }

    #[tokio::test]
    async fn list_is_scoped_to_tenant() {
        let svc = test_service().await;
        svc.create_customer("acme", "A", "a@acme.test", None)
            .await
            .unwrap();
        svc.create_customer("acme", "B", "b@acme.test", None)
            .await
            .unwrap();
        svc.create_customer("globex", "C", "c@globex.test", None)
            .await
            .unwrap();

        let acme = svc.list_customers("acme").await.unwrap();
        assert_eq!(acme.len(), 2);
        assert!(acme.iter().all(|c| c.tenant_id == "acme"));
    }

    #[tokio::test]
    async fn set_remote_id_persists() {
        let svc = test_service().await;
        let customer = svc
            .create_customer("acme", "Ada", "ada@example.com", None)
            .await
            .unwrap();

        svc.set_customer_remote_id(&customer.id, RemoteId(41))
            .await
            .unwrap();
        let fetched = svc.get_customer(&customer.id).await.unwrap();
        assert_eq!(fetched.remote_customer_id, Some(RemoteId(41)));
    }
}
