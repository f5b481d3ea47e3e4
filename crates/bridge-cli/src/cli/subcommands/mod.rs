mod pay;
mod sync;

pub use pay::{DocumentArg, PayCommands, PayLinkArgs};
pub use sync::{BatchArgs, SyncCommands};
