//! Row and outcome types

pub mod outcome;
pub mod row;

pub use outcome::{Confirmation, OutcomeKind, TransactionOutcome};
pub use row::{Action, InputRow, RejectedRow, SecretKey, SkipReason};
