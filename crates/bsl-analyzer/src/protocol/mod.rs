//! State machines over statement streams: transaction lifecycle and
//! async-call trailers. Both walk method bodies directly; they do not
//! need a control-flow graph.

pub mod async_call;
pub mod transaction;

pub use async_call::{check as check_async_calls, AsyncFinding, AsyncPolicy};
pub use transaction::{check as check_transactions, TxFinding, TxIssue};
