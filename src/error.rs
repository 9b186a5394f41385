//! Error taxonomy for user-initiated operations.
//!
//! Read-path errors live next to their layers (`LedgerError`, `SyncError`, `WalletError`) and
//! are re-exported here. `ActionError` covers the write path and carries the text shown to the
//! user through the feedback message.

pub use crate::ledger::LedgerError;
pub use crate::sync::SyncError;
pub use crate::wallet::WalletError;

/// Local precondition failures. Raised before any ledger call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("Option {option_index} does not exist on poll {poll_id} ({option_count} options)")]
	OptionOutOfRange {
		poll_id: u64,
		option_index: usize,
		option_count: usize,
	},

	#[error("Poll {0} is not in the synchronized view")]
	UnknownPoll(u64),

	#[error("Minimum 2 options required")]
	TooFewOptions { provided: usize },

	#[error("A question is required")]
	EmptyQuestion,
}

/// Errors from mutating operations
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("Another transaction is already in flight")]
	Busy,

	#[error("Wallet not connected")]
	NotConnected,

	#[error("Duplicate vote rejected by the ledger")]
	DuplicateVote,

	#[error("Transaction failed: {0}")]
	Transaction(#[source] LedgerError),
}

/// Which mutating operation an error came from; selects the generic failure text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
	Vote,
	CreatePoll,
}

impl ActionError {
	/// Text shown to the user for this failure.
	pub fn feedback_text(&self, kind: ActionKind) -> String {
		match self {
			ActionError::Validation(e) => e.to_string(),
			ActionError::Busy => "Another transaction is in progress".to_string(),
			ActionError::NotConnected => "Connect your wallet first".to_string(),
			ActionError::DuplicateVote => "You already voted!".to_string(),
			ActionError::Transaction(_) => match kind {
				ActionKind::Vote => "Voting failed".to_string(),
				ActionKind::CreatePoll => "Failed to create poll".to_string(),
			},
		}
	}
}
