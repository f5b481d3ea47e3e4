use anyhow::{Context, bail};
use bridge_core::RemoteId;
use bridge_db::LocalStore;
use bridge_sync::BatchReport;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{BatchArgs, SyncCommands};
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct SyncedEntity<'a> {
    local_id: &'a str,
    remote_id: RemoteId,
}

#[derive(Clone, Copy)]
enum BatchKind {
    Customers,
    Plans,
    Memberships,
}

/// Handle `erpb sync`.
pub async fn handle(
    action: &SyncCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SyncCommands::Customer { id } => {
            let tenant = ctx.store.customer(id).await?.tenant_id;
            let remote_id = ctx
                .orchestrator_for(&tenant)?
                .sync_customer_to_remote(id)
                .await
                .with_context(|| format!("failed to sync customer {id}"))?;
            output(&SyncedEntity { local_id: id, remote_id }, flags.format)
        }
        SyncCommands::Plan { id } => {
            let tenant = ctx.store.plan(id).await?.tenant_id;
            let remote_id = ctx
                .orchestrator_for(&tenant)?
                .sync_plan_to_remote(id)
                .await
                .with_context(|| format!("failed to sync plan {id}"))?;
            output(&SyncedEntity { local_id: id, remote_id }, flags.format)
        }
        SyncCommands::Membership { id } => {
            let tenant = ctx.store.membership(id).await?.tenant_id;
            let remote_id = ctx
                .orchestrator_for(&tenant)?
                .sync_membership_to_remote(id)
                .await
                .with_context(|| format!("failed to sync membership {id}"))?;
            output(&SyncedEntity { local_id: id, remote_id }, flags.format)
        }
        SyncCommands::Invoice { id } => {
            let tenant = ctx.store.invoice(id).await?.tenant_id;
            let remote_id = ctx
                .orchestrator_for(&tenant)?
                .sync_invoice_to_remote(id)
                .await
                .with_context(|| format!("failed to sync invoice {id}"))?;
            output(&SyncedEntity { local_id: id, remote_id }, flags.format)
        }
        SyncCommands::Customers(args) => run_batch(BatchKind::Customers, args, ctx, flags).await,
        SyncCommands::Plans(args) => run_batch(BatchKind::Plans, args, ctx, flags).await,
        SyncCommands::Memberships(args) => run_batch(BatchKind::Memberships, args, ctx, flags).await,
    }
}

async fn run_batch(
    kind: BatchKind,
    args: &BatchArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let orchestrator = ctx.orchestrator_for(&args.tenant)?;
    let tenant = args.tenant.as_str();
    let only = args.only.clone();

    let report = match (kind, only.is_empty()) {
        (BatchKind::Customers, true) => orchestrator.sync_all_customers(tenant).await?,
        (BatchKind::Plans, true) => orchestrator.sync_all_plans(tenant).await?,
        (BatchKind::Memberships, true) => orchestrator.sync_all_memberships(tenant).await?,
        (BatchKind::Customers, false) => orchestrator.sync_customers(tenant, only).await,
        (BatchKind::Plans, false) => orchestrator.sync_plans(tenant, only).await,
        (BatchKind::Memberships, false) => orchestrator.sync_memberships(tenant, only).await,
    };

    output(&report, flags.format)?;
    fail_on_partial(&report)
}

fn fail_on_partial(report: &BatchReport) -> anyhow::Result<()> {
    if report.is_clean() {
        return Ok(());
    }
    bail!(
        "{} of {} {} item(s) failed; rerun with --only {}",
        report.failed.len(),
        report.failed.len() + report.succeeded.len(),
        report.kind,
        report.failed_ids().join(",")
    )
}
