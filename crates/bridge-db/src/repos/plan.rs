//! Plan repository.

use bridge_core::RemoteId;
use bridge_core::entities::Plan;
use bridge_core::enums::BillingCadence;
use bridge_core::ids::PREFIX_PLAN;
use chrono::Utc;

use crate::error::DatabaseError;
use crate::helpers::{get_remote_id, parse_datetime, parse_enum};
use crate::service::LedgerService;

const SELECT_COLS: &str =
    "id, tenant_id, name, price_cents, cadence, remote_product_id, created_at, updated_at";

fn row_to_plan(row: &libsql::Row) -> Result<Plan, DatabaseError> {
    Ok(Plan {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        price_cents: row.get(3)?,
        cadence: parse_enum(&row.get::<String>(4)?)?,
        remote_product_id: get_remote_id(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl LedgerService {
    pub async fn create_plan(
        &self,
        tenant_id: &str,
        name: &str,
        price_cents: i64,
        cadence: BillingCadence,
    ) -> Result<Plan, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PLAN).await?;

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO plans ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7)"
                ),
                libsql::params![
                    id.as_str(),
                    tenant_id,
                    name,
                    price_cents,
                    cadence.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Plan {
            id,
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            price_cents,
            cadence,
            remote_product_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_plan(&self, id: &str) -> Result<Plan, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM plans WHERE id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_plan(&row)
    }

    pub async fn list_plans(&self, tenant_id: &str) -> Result<Vec<Plan>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM plans WHERE tenant_id = ?1
                     ORDER BY created_at, id"
                ),
                [tenant_id],
            )
            .await?;
        let mut plans = Vec::new();
        while let Some(row) = rows.next().await? {
            plans.push(row_to_plan(&row)?);
        }
        Ok(plans)
    }

    pub async fn set_plan_remote_id(
        &self,
        id: &str,
        remote_id: RemoteId,
    ) -> Result<(), DatabaseError> {
        self.set_remote_id("plans", "remote_product_id", id, remote_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn create_and_get_plan() {
        let svc = test_service().await;
        let plan = svc
            .create_plan("acme", "Gold", 4_900, BillingCadence::Monthly)
            .await
            .unwrap();
        let fetched = svc.get_plan(&plan.id).await.unwrap();
        assert_eq!(fetched, plan);
        assert_eq!(fetched.cadence, BillingCadence::Monthly);
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let svc = test_service().await;
        let result = svc
            .create_plan("acme", "Broken", -1, BillingCadence::Yearly)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn remapping_to_different_remote_id_conflicts() {
        let svc = test_service().await;
        let plan = svc
            .create_plan("acme", "Gold", 4_900, BillingCadence::Yearly)
            .await
            .unwrap();

        svc.set_plan_remote_id(&plan.id, RemoteId(5)).await.unwrap();
        // Same value again is fine.
        svc.set_plan_remote_id(&plan.id, RemoteId(5)).await.unwrap();

        let err = svc
            .set_plan_remote_id(&plan.id, RemoteId(6))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::MappingConflict {
                existing: 5,
                attempted: 6,
                ..
            }
        ));
        assert_eq!(
            svc.get_plan(&plan.id).await.unwrap().remote_product_id,
            Some(RemoteId(5))
        );
    }

    #[tokio::test]
    async fn set_remote_id_on_missing_plan_is_no_result() {
        let svc = test_service().await;
        let err = svc
            .set_plan_remote_id("pln-00000000", RemoteId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NoResult));
    }
}
