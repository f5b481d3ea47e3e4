use anyhow::Context;
use bridge_core::RemoteId;
use bridge_sync::PaymentLinkRequest;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{PayCommands, PayLinkArgs};
use crate::context::AppContext;
use crate::output::output;

/// Handle `erpb pay`.
pub async fn handle(
    action: &PayCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        PayCommands::Link(args) => {
            let link = ctx
                .broker_for(&args.tenant)?
                .create_payment_link(link_request(args))
                .await
                .context("failed to create payment link")?;
            output(&link, flags.format)
        }
        PayCommands::Status { reference, tenant } => {
            let status = ctx
                .broker_for(tenant)?
                .transaction_status(reference)
                .await
                .with_context(|| format!("failed to read transaction {reference}"))?;
            if status.is_none() && !flags.quiet {
                eprintln!("no transaction with reference '{reference}' yet");
            }
            output(&status, flags.format)
        }
        PayCommands::Acquirers { tenant } => {
            let acquirers = ctx.broker_for(tenant)?.acquirers().await?;
            output(&acquirers, flags.format)
        }
    }
}

fn link_request(args: &PayLinkArgs) -> PaymentLinkRequest {
    PaymentLinkRequest {
        document: args.document.into(),
        document_id: RemoteId(args.document_id),
        amount_cents: args.amount_cents,
        currency: args.currency.clone(),
        external_ref: args.reference.clone(),
        return_url: args.return_url.clone(),
        cancel_url: args.cancel_url.clone(),
        acquirer_id: args.acquirer.map(RemoteId),
    }
}
