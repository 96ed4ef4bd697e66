//! Transaction writes, transfers and listing.
//!
//! Every write reconciles the affected accounts before its DB transaction
//! commits, so a failed reconciliation rolls the write back.

mod list;
mod transfer;
mod write;

pub use list::TransactionListFilter;
pub use transfer::TransferResult;
