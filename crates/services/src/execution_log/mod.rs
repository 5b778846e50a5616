//! Live mirror of the remote execution log, with guarded create and
//! confirmed delete.

mod ports;
mod store;

pub use ports::{AlwaysConfirm, ConfirmPrompt, NeverConfirm, TracingNotice, UserNotice};
pub use store::{DeleteOutcome, ExecutionLogStore, LogSubscription, StoreState};
