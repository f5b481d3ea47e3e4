use clap::{Args, Subcommand};

/// Sync commands. Single-entity commands resolve the tenant from the entity.
#[derive(Clone, Debug, Subcommand)]
pub enum SyncCommands {
    /// Sync one customer to a remote partner.
    Customer { id: String },
    /// Sync one plan to a remote product.
    Plan { id: String },
    /// Sync one membership (and its customer and plan) to a remote subscription.
    Membership { id: String },
    /// Sync one invoice (and its customer) to a posted remote invoice.
    Invoice { id: String },
    /// Sync all customers of a tenant.
    Customers(BatchArgs),
    /// Sync all plans of a tenant.
    Plans(BatchArgs),
    /// Sync all memberships of a tenant.
    Memberships(BatchArgs),
}

#[derive(Clone, Debug, Args)]
pub struct BatchArgs {
    /// Tenant whose entities to sync.
    #[arg(long)]
    pub tenant: String,
    /// Restrict the batch to these local ids (e.g. a previous run's failures).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}
