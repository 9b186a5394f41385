use crate::ledger::{AddressError, LedgerError};

use futures_util::Stream;
use std::pin::Pin;

use crate::ledger::Address;

/// Stream of account-change notifications. Each item is the wallet's full account list,
/// the active account first. Dropping the stream ends the subscription.
pub type AccountStream = Pin<Box<dyn Stream<Item = Vec<Address>> + Send>>;

/// Wallet connection errors
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
	#[error("Wallet unreachable: {0}")]
	Transport(#[from] LedgerError),

	#[error("Wallet returned an invalid account: {0}")]
	InvalidAccount(#[from] AddressError),

	#[error("Wallet returned no accounts")]
	NoAccounts,

	#[error("Connection rejected: {0}")]
	Rejected(String),
}
