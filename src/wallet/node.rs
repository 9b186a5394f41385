//!
//! Wallet backed by a node's managed accounts.
//!
//! Development nodes expose unlocked accounts through `eth_accounts` and sign
//! `eth_sendTransaction` on their behalf. Account changes are detected by polling.

use super::{AccountStream, WalletError, WalletProvider};
use crate::ledger::{Address, RpcTransport};

use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct NodeWallet {
	transport: RpcTransport,
	poll_interval: Duration,
}

impl NodeWallet {
	pub fn new(transport: RpcTransport, poll_interval: Duration) -> Self {
		Self {
			transport,
			poll_interval,
		}
	}
}

async fn fetch_accounts(transport: &RpcTransport) -> Result<Vec<Address>, WalletError> {
	let result = transport.request("eth_accounts", json!([])).await?;
	let accounts = result
		.as_array()
		.ok_or_else(|| WalletError::Rejected("eth_accounts did not return a list".to_string()))?;

	accounts
		.iter()
		.map(|account| {
			let account = account.as_str().ok_or_else(|| {
				WalletError::Rejected("account entry is not a string".to_string())
			})?;
			Ok(account.parse::<Address>()?)
		})
		.collect()
}

#[async_trait::async_trait]
impl WalletProvider for NodeWallet {
	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		let accounts = fetch_accounts(&self.transport).await?;
		debug!("Node reports {} accounts", accounts.len());
		Ok(accounts)
	}

	async fn subscribe_accounts(&self) -> Result<AccountStream, WalletError> {
		let initial = fetch_accounts(&self.transport).await?;
		let transport = self.transport.clone();
		let interval = self.poll_interval;

		info!(
			"Watching {} for account changes every {:?}",
			transport.url(),
			interval
		);

		let stream = futures_util::stream::unfold(initial, move |last| {
			let transport = transport.clone();
			async move {
				loop {
					tokio::time::sleep(interval).await;
					match fetch_accounts(&transport).await {
						Ok(accounts) if accounts != last => {
							return Some((accounts.clone(), accounts));
						}
						Ok(_) => {}
						Err(e) => warn!("Account poll failed: {}", e),
					}
				}
			}
		});

		Ok(Box::pin(stream))
	}
}
