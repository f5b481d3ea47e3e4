use clap::Subcommand;

use crate::cli::subcommands::{PayCommands, SyncCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Push local entities to the ERP.
    Sync {
        #[command(subcommand)]
        action: SyncCommands,
    },
    /// Payment links and transaction status.
    Pay {
        #[command(subcommand)]
        action: PayCommands,
    },
}
