pub mod dispatch;
pub mod pay;
pub mod sync;
