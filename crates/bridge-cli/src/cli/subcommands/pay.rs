use bridge_core::enums::PaymentDocument;
use clap::{Args, Subcommand, ValueEnum};

#[derive(Clone, Debug, Subcommand)]
pub enum PayCommands {
    /// Create a hosted payment link for an ERP document.
    Link(PayLinkArgs),
    /// Show the state of a transaction by its reference.
    Status {
        reference: String,
        #[arg(long)]
        tenant: String,
    },
    /// List the ERP's payment acquirers.
    Acquirers {
        #[arg(long)]
        tenant: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DocumentArg {
    Subscription,
    Invoice,
}

impl From<DocumentArg> for PaymentDocument {
    fn from(arg: DocumentArg) -> Self {
        match arg {
            DocumentArg::Subscription => Self::Subscription,
            DocumentArg::Invoice => Self::Invoice,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct PayLinkArgs {
    #[arg(long)]
    pub tenant: String,
    #[arg(long, value_enum)]
    pub document: DocumentArg,
    /// Remote id of the subscription or invoice.
    #[arg(long)]
    pub document_id: i64,
    #[arg(long)]
    pub amount_cents: i64,
    /// ISO currency code.
    #[arg(long)]
    pub currency: String,
    /// Transaction reference, used later with `pay status`.
    #[arg(long)]
    pub reference: String,
    #[arg(long)]
    pub return_url: String,
    #[arg(long)]
    pub cancel_url: String,
    /// Acquirer id; defaults to the first enabled one.
    #[arg(long)]
    pub acquirer: Option<i64>,
}
