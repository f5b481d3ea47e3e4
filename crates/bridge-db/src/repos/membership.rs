//! Membership repository.

use bridge_core::RemoteId;
use bridge_core::entities::Membership;
use bridge_core::ids::PREFIX_MEMBERSHIP;
use chrono::Utc;

use crate::error::DatabaseError;
use crate::helpers::{get_remote_id, parse_datetime};
use crate::service::LedgerService;

const SELECT_COLS: &str =
    "id, tenant_id, customer_id, plan_id, remote_subscription_id, created_at, updated_at";

fn row_to_membership(row: &libsql::Row) -> Result<Membership, DatabaseError> {
    Ok(Membership {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        customer_id: row.get(2)?,
        plan_id: row.get(3)?,
        remote_subscription_id: get_remote_id(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl LedgerService {
    pub async fn create_membership(
        &self,
        tenant_id: &str,
        customer_id: &str,
        plan_id: &str,
    ) -> Result<Membership, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_MEMBERSHIP).await?;

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO memberships ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)"
                ),
                libsql::params![
                    id.as_str(),
                    tenant_id,
                    customer_id,
                    plan_id,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Membership {
            id,
            tenant_id: tenant_id.to_string(),
            customer_id: customer_id.to_string(),
            plan_id: plan_id.to_string(),
            remote_subscription_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_membership(&self, id: &str) -> Result<Membership, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM memberships WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_membership(&row)
    }

    pub async fn list_memberships(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<Membership>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM memberships WHERE tenant_id = ?1
                     ORDER BY created_at, id"
                ),
                [tenant_id],
            )
            .await?;
        let mut memberships = Vec::new();
        while let Some(row) = rows.next().await? {
            memberships.push(row_to_membership(&row)?);
        }
        Ok(memberships)
    }

    pub async fn set_membership_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        self.set_remote_id("memberships", "remote_subscription_id", id, remote_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use bridge_core::enums::BillingCadence;

    use super::*;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn membership_requires_existing_customer_and_plan() {
        let svc = test_service().await;
        let result = svc
            .create_membership("acme", "cus-00000000", "pln-00000000")
            .await;
        assert!(result.is_err(), "foreign keys should be enforced");
    }

    #[tokio::test]
    async fn create_get_and_map_membership() {
        let svc = test_service().await;
        let customer = svc
            .create_customer("acme", "Ada", "ada@example.com", None)
            .await
            .unwrap();
        let plan = svc
            .create_plan("acme", "Gold", 1_000, BillingCadence::Monthly)
            .await
            .unwrap();
        let membership = svc
            .create_membership("acme", &customer.id, &plan.id)
            .await
            .unwrap();

        svc.set_membership_remote_id(&membership.id, RemoteId(300))
            .await
            .unwrap();
        let fetched = svc.get_membership(&membership.id).await.unwrap();
        assert_eq!(fetched.customer_id, customer.id);
        assert_eq!(fetched.plan_id, plan.id);
        assert_eq!(fetched.remote_subscription_id, Some(RemoteId(300)));
    }
}
