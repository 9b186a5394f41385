pub mod node;
pub mod types;

pub use node::NodeWallet;
pub use types::*;

use crate::ledger::Address;

/// Source of the user's account identity.
///
/// Transactions are signed by the ledger client on behalf of the account passed to each
/// mutating call, so the wallet only needs to report which account is active.
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync {
	/// Request the connected account list, active account first.
	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

	/// Subscribe to account-change notifications.
	async fn subscribe_accounts(&self) -> Result<AccountStream, WalletError>;
}
