//! Terminal outcome of one row

use super::row::SkipReason;
use alloy::primitives::TxHash;
use std::fmt;

/// Inclusion report for a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    /// Execution status; `false` means the transaction reverted
    pub success: bool,
}

/// Exactly one per input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Excluded before submission
    Skipped { reason: SkipReason },
    /// Broadcast, not awaited
    Submitted { hash: TxHash },
    /// Included in a block
    Confirmed {
        hash: TxHash,
        block_number: u64,
        gas_used: u64,
        success: bool,
    },
    /// Signer, query, submission or confirmation error
    Failed { reason: String },
}

/// Outcome variant without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Skipped,
    Submitted,
    Confirmed,
    Failed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Skipped => "skipped",
            OutcomeKind::Submitted => "submitted",
            OutcomeKind::Confirmed => "confirmed",
            OutcomeKind::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransactionOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            TransactionOutcome::Skipped { .. } => OutcomeKind::Skipped,
            TransactionOutcome::Submitted { .. } => OutcomeKind::Submitted,
            TransactionOutcome::Confirmed { .. } => OutcomeKind::Confirmed,
            TransactionOutcome::Failed { .. } => OutcomeKind::Failed,
        }
    }

    /// Transaction hash, if the row got as far as broadcasting
    pub fn hash(&self) -> Option<TxHash> {
        match self {
            TransactionOutcome::Submitted { hash } | TransactionOutcome::Confirmed { hash, .. } => {
                Some(*hash)
            }
            _ => None,
        }
    }

    /// Broadcast, or included with a successful status
    pub fn is_success(&self) -> bool {
        match self {
            TransactionOutcome::Submitted { .. } => true,
            TransactionOutcome::Confirmed { success, .. } => *success,
            _ => false,
        }
    }

    /// Result-table cells: status, hash, block, gas used, detail
    pub fn to_cells(&self) -> [String; 5] {
        match self {
            TransactionOutcome::Skipped { reason } => [
                self.kind().to_string(),
                String::new(),
                String::new(),
                String::new(),
                reason.to_string(),
            ],
            TransactionOutcome::Submitted { hash } => [
                self.kind().to_string(),
                hash.to_string(),
                String::new(),
                String::new(),
                String::new(),
            ],
            TransactionOutcome::Confirmed {
                hash,
                block_number,
                gas_used,
                success,
            } => [
                self.kind().to_string(),
                hash.to_string(),
                block_number.to_string(),
                gas_used.to_string(),
                if *success { "success" } else { "reverted" }.to_string(),
            ],
            TransactionOutcome::Failed { reason } => [
                self.kind().to_string(),
                String::new(),
                String::new(),
                String::new(),
                reason.clone(),
            ],
        }
    }
}

impl From<Confirmation> for TransactionOutcome {
    fn from(confirmation: Confirmation) -> Self {
        TransactionOutcome::Confirmed {
            hash: confirmation.hash,
            block_number: confirmation.block_number,
            gas_used: confirmation.gas_used,
            success: confirmation.success,
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            TransactionOutcome::Submitted { hash } => write!(f, "submitted {}", hash),
            TransactionOutcome::Confirmed {
                hash,
                block_number,
                success,
                ..
            } => write!(
                f,
                "{} {} in block {}",
                if *success { "confirmed" } else { "reverted" },
                hash,
                block_number
            ),
            TransactionOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}
