//! Wallet account-change subscription.
//!
//! The subscription lives in a background task owned by an `AccountWatcherHandle`. Each
//! notification replaces the active identity immediately, in arrival order, and starts a full
//! refresh under it. Mutations already in flight are left alone. Dropping the handle, or
//! calling `unsubscribe`, stops the task and releases the wallet stream.

use crate::session::PollSession;
use crate::wallet::WalletError;

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct AccountWatcher;

impl AccountWatcher {
	/// Subscribe to the session wallet's account changes.
	///
	/// # Errors
	/// Returns the wallet's error if the subscription cannot be established.
	pub async fn spawn(session: Arc<PollSession>) -> Result<AccountWatcherHandle, WalletError> {
		let mut accounts = session.wallet().subscribe_accounts().await?;
		let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

		info!("Subscribed to wallet account changes");

		let task = tokio::spawn(async move {
			loop {
				tokio::select! {
					_ = &mut shutdown_rx => {
						debug!("Account watcher shutting down");
						break;
					}
					next = accounts.next() => {
						let Some(list) = next else {
							info!("Wallet closed the account subscription");
							break;
						};
						session.set_active_account(list.first().copied()).await;
						let session = session.clone();
						tokio::spawn(async move { session.refresh().await });
					}
				}
			}
		});

		Ok(AccountWatcherHandle {
			shutdown: Some(shutdown_tx),
			task: Some(task),
		})
	}
}

/// Lifecycle handle for a running `AccountWatcher`.
pub struct AccountWatcherHandle {
	shutdown: Option<oneshot::Sender<()>>,
	task: Option<JoinHandle<()>>,
}

impl AccountWatcherHandle {
	/// Stop watching and wait until the wallet subscription has been released.
	pub async fn unsubscribe(mut self) {
		if let Some(shutdown) = self.shutdown.take() {
			let _ = shutdown.send(());
		}
		if let Some(task) = self.task.take() {
			if let Err(e) = task.await {
				warn!("Account watcher task ended abnormally: {}", e);
			}
		}
		info!("Unsubscribed from wallet account changes");
	}

	pub fn is_finished(&self) -> bool {
		self.task.as_ref().is_none_or(JoinHandle::is_finished)
	}
}

impl Drop for AccountWatcherHandle {
	fn drop(&mut self) {
		if let Some(shutdown) = self.shutdown.take() {
			let _ = shutdown.send(());
		}
	}
}
