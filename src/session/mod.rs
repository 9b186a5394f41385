//! Session controller.
//!
//! `PollSession` exclusively owns the session state. Every write goes through one of its
//! operations and presentation only ever reads immutable `SessionSnapshot`s. Refreshed
//! collections are replaced whole, never mutated in place, and each replacement is guarded by a
//! refresh-generation ticket so an older refresh finishing late cannot overwrite a newer one.

mod draft;
mod state;

pub use draft::{MIN_OPTIONS, PollDraft};
pub use state::{RefreshGeneration, SessionSnapshot};

use state::SessionState;

use crate::actions::{Resynchronize, VoteActionCoordinator};
use crate::config::{EngineConfig, POLL_EXPIRY_DAYS};
use crate::error::{ActionError, ActionKind, ValidationError};
use crate::feedback::{ChangeNotifier, FeedbackController};
use crate::ledger::{Address, LedgerClient, TxReceipt};
use crate::sync::{
	LeaderboardEntry, LeaderboardSynchronizer, Poll, PollSynchronizer, RefreshStats, SyncError,
};
use crate::view::FilterMode;
use crate::wallet::{WalletError, WalletProvider};

use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info, warn};

pub struct PollSession {
	state: RwLock<SessionState>,
	polls_sync: PollSynchronizer,
	leaderboard_sync: LeaderboardSynchronizer,
	actions: VoteActionCoordinator,
	wallet: Arc<dyn WalletProvider>,
	feedback: FeedbackController,
	/// Bumped after every committed state change, feedback expiry included
	changes: ChangeNotifier,
}

impl PollSession {
	/// Must be created inside a Tokio runtime.
	pub fn new(
		ledger: Arc<dyn LedgerClient>,
		wallet: Arc<dyn WalletProvider>,
		config: EngineConfig,
	) -> Self {
		let (changes, _) = watch::channel(0);
		let changes = Arc::new(changes);
		Self {
			state: RwLock::new(SessionState::default()),
			polls_sync: PollSynchronizer::new(ledger.clone(), config.fetch_concurrency),
			leaderboard_sync: LeaderboardSynchronizer::new(ledger.clone()),
			actions: VoteActionCoordinator::new(ledger),
			wallet,
			feedback: FeedbackController::new(config.feedback_ttl).with_notifier(changes.clone()),
			changes,
		}
	}

	pub fn wallet(&self) -> &Arc<dyn WalletProvider> {
		&self.wallet
	}

	pub fn feedback(&self) -> &FeedbackController {
		&self.feedback
	}

	/// Receiver woken after every committed state change.
	pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
		self.changes.subscribe()
	}

	fn notify_changed(&self) {
		self.changes.send_modify(|version| *version += 1);
	}

	pub async fn snapshot(&self) -> SessionSnapshot {
		let state = self.state.read().await;
		SessionSnapshot {
			active_account: state.active_account,
			polls: state.polls.clone(),
			leaderboard: state.leaderboard.clone(),
			search_query: state.search_query.clone(),
			filter_mode: state.filter_mode,
			draft: state.draft.clone(),
			busy: self.actions.is_busy(),
			feedback: self.feedback.current(),
		}
	}

	pub async fn active_account(&self) -> Option<Address> {
		self.state.read().await.active_account
	}

	// Connection

	/// Adopt an account the wallet has already authorized, if any, then refresh.
	///
	/// A wallet without accounts, or one that refuses, is not an error here.
	pub async fn initialize(&self) {
		match self.wallet.request_accounts().await {
			Ok(accounts) => match accounts.first() {
				Some(account) => {
					info!("Resuming session for {}", account);
					self.set_active_account(Some(*account)).await;
				}
				None => debug!("No authorized account, continuing read-only"),
			},
			Err(e) => debug!("No authorized account ({}), continuing read-only", e),
		}
		self.refresh().await;
	}

	/// Request the account list, make the first account active and refresh under it.
	///
	/// # Errors
	/// `WalletError` if the wallet is unreachable, refuses, or reports no account. The failure
	/// is also reported through feedback; the session keeps running read-only.
	pub async fn connect(&self) -> Result<Address, WalletError> {
		let account = match self.wallet.request_accounts().await {
			Ok(accounts) => accounts.first().copied().ok_or(WalletError::NoAccounts),
			Err(e) => Err(e),
		};

		match account {
			Ok(account) => {
				info!("Wallet connected as {}", account);
				self.set_active_account(Some(account)).await;
				self.refresh().await;
				self.feedback.success("Wallet connected!");
				Ok(account)
			}
			Err(e) => {
				error!("Wallet connection failed: {}", e);
				self.feedback.error("Failed to connect wallet");
				Err(e)
			}
		}
	}

	/// Replace the active identity. Does not refresh.
	pub async fn set_active_account(&self, account: Option<Address>) {
		let mut state = self.state.write().await;
		if state.active_account == account {
			return;
		}
		match account {
			Some(account) => info!("Active account is now {}", account),
			None => info!("Wallet reports no account, continuing read-only"),
		}
		state.active_account = account;
		drop(state);
		self.notify_changed();
	}

	/// Adopt the first account of a wallet notification and refresh under it.
	pub async fn switch_account(&self, accounts: &[Address]) {
		self.set_active_account(accounts.first().copied()).await;
		self.refresh().await;
	}

	// Read paths

	/// Refresh polls and leaderboard concurrently. Neither failure affects the other.
	pub async fn refresh(&self) {
		let _ = tokio::join!(self.refresh_polls(), self.refresh_leaderboard());
	}

	/// Re-synchronize the poll list under the active account.
	///
	/// # Errors
	/// `SyncError::PollCount` if the count query fails; the previous list is kept.
	pub async fn refresh_polls(&self) -> Result<RefreshStats, SyncError> {
		let (ticket, account) = self.begin_poll_refresh().await;

		match self.polls_sync.refresh_all(account.as_ref()).await {
			Ok(refresh) => {
				self.commit_polls(ticket, refresh.polls).await;
				Ok(refresh.stats)
			}
			Err(e) => {
				error!("Poll refresh #{} failed, keeping previous list: {}", ticket, e);
				self.feedback.error("Failed to load polls");
				Err(e)
			}
		}
	}

	/// Re-synchronize the leaderboard.
	///
	/// # Errors
	/// `SyncError::Leaderboard` if the ranking query fails; the leaderboard becomes empty.
	pub async fn refresh_leaderboard(&self) -> Result<RefreshStats, SyncError> {
		let ticket = self.state.write().await.leaderboard_generation.issue();

		match self.leaderboard_sync.refresh_leaderboard().await {
			Ok((entries, stats)) => {
				self.commit_leaderboard(ticket, entries).await;
				Ok(stats)
			}
			Err(e) => {
				warn!("Leaderboard refresh #{} failed: {}", ticket, e);
				self.commit_leaderboard(ticket, Vec::new()).await;
				Err(e)
			}
		}
	}

	async fn begin_poll_refresh(&self) -> (u64, Option<Address>) {
		let mut state = self.state.write().await;
		(state.poll_generation.issue(), state.active_account)
	}

	async fn commit_polls(&self, ticket: u64, polls: Vec<Poll>) -> bool {
		let mut state = self.state.write().await;
		if !state.poll_generation.try_commit(ticket) {
			debug!("Discarding stale poll refresh #{}", ticket);
			return false;
		}
		state.polls = Arc::new(polls);
		drop(state);
		self.notify_changed();
		true
	}

	async fn commit_leaderboard(&self, ticket: u64, entries: Vec<LeaderboardEntry>) -> bool {
		let mut state = self.state.write().await;
		if !state.leaderboard_generation.try_commit(ticket) {
			debug!("Discarding stale leaderboard refresh #{}", ticket);
			return false;
		}
		state.leaderboard = Arc::new(entries);
		drop(state);
		self.notify_changed();
		true
	}

	// View inputs

	pub async fn set_search(&self, query: impl Into<String>) {
		self.state.write().await.search_query = query.into();
		self.notify_changed();
	}

	pub async fn set_filter(&self, mode: FilterMode) {
		self.state.write().await.filter_mode = mode;
		self.notify_changed();
	}

	// Authoring draft

	pub async fn set_draft_question(&self, question: impl Into<String>) {
		self.state.write().await.draft.question = question.into();
		self.notify_changed();
	}

	pub async fn add_draft_option(&self) {
		self.state.write().await.draft.add_option();
		self.notify_changed();
	}

	pub async fn remove_draft_option(&self, index: usize) -> bool {
		let removed = self.state.write().await.draft.remove_option(index);
		if removed {
			self.notify_changed();
		}
		removed
	}

	pub async fn update_draft_option(&self, index: usize, value: impl Into<String>) -> bool {
		let updated = self.state.write().await.draft.update_option(index, value);
		if updated {
			self.notify_changed();
		}
		updated
	}

	// Mutations

	/// Vote on a poll from the synchronized view as the active account.
	pub async fn vote(&self, poll_id: u64, option_index: usize) -> Result<TxReceipt, ActionError> {
		let result = self.try_vote(poll_id, option_index).await;
		self.report(result, ActionKind::Vote, "Vote recorded!")
	}

	async fn try_vote(&self, poll_id: u64, option_index: usize) -> Result<TxReceipt, ActionError> {
		let (account, poll) = {
			let state = self.state.read().await;
			let poll = state.polls.iter().find(|poll| poll.id == poll_id).cloned();
			(state.active_account, poll)
		};
		let account = account.ok_or(ActionError::NotConnected)?;
		let poll = poll.ok_or(ValidationError::UnknownPoll(poll_id))?;

		self.actions
			.submit_vote(self, &account, &poll, option_index)
			.await
	}

	/// Create a poll with the fixed expiry as the active account.
	pub async fn create_poll(
		&self,
		question: &str,
		options: &[String],
	) -> Result<TxReceipt, ActionError> {
		let result = self.try_create(self, question, options).await;
		self.report(result, ActionKind::CreatePoll, "Poll created!")
	}

	/// Submit the authoring draft. The draft is cleared once the ledger confirms, before the
	/// follow-up refresh; on failure it is kept for correction.
	pub async fn submit_draft(&self) -> Result<TxReceipt, ActionError> {
		let draft = self.state.read().await.draft.clone();
		let resync = ClearDraftThenRefresh { session: self };
		let result = self
			.try_create(&resync, &draft.question, &draft.options)
			.await;
		self.report(result, ActionKind::CreatePoll, "Poll created!")
	}

	async fn try_create(
		&self,
		resync: &dyn Resynchronize,
		question: &str,
		options: &[String],
	) -> Result<TxReceipt, ActionError> {
		let account = self
			.active_account()
			.await
			.ok_or(ActionError::NotConnected)?;

		self.actions
			.create_poll(resync, &account, question, options, POLL_EXPIRY_DAYS)
			.await
	}

	fn report(
		&self,
		result: Result<TxReceipt, ActionError>,
		kind: ActionKind,
		success: &str,
	) -> Result<TxReceipt, ActionError> {
		match &result {
			Ok(receipt) => {
				info!("{:?} confirmed in {}", kind, receipt.hash);
				self.feedback.success(success);
			}
			Err(e) => {
				warn!("{:?} failed: {}", kind, e);
				self.feedback.error(e.feedback_text(kind));
			}
		}
		self.notify_changed();
		result
	}
}

#[async_trait::async_trait]
impl Resynchronize for PollSession {
	async fn resynchronize(&self) {
		self.refresh().await;
	}
}

struct ClearDraftThenRefresh<'a> {
	session: &'a PollSession,
}

#[async_trait::async_trait]
impl<'a> Resynchronize for ClearDraftThenRefresh<'a> {
	async fn resynchronize(&self) {
		self.session.state.write().await.draft.clear();
		self.session.notify_changed();
		self.session.refresh().await;
	}
}
