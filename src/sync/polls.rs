//! Full poll-set synchronization for the active account.
//!
//! Walks every id the ledger reports, fetches the record, the account's voting status and the
//! expiry, and normalizes the result. One unreadable or malformed record never blanks the
//! board: it is logged and skipped. Only the count query is fatal.

use crate::ledger::{Address, LedgerClient, LedgerError};
use crate::sync::progress::RefreshStats;
use crate::sync::types::{Poll, SyncError, VoteStatus, normalize_poll};

use futures_util::{StreamExt, stream};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a successful poll refresh
#[derive(Debug, Clone)]
pub struct PollRefresh {
	/// Polls in ascending id order
	pub polls: Vec<Poll>,
	pub stats: RefreshStats,
}

pub struct PollSynchronizer {
	ledger: Arc<dyn LedgerClient>,
	/// Maximum number of per-id fetches in flight.
	concurrency: usize,
}

impl PollSynchronizer {
	/// Create a synchronizer. A `concurrency` of 1 fetches ids strictly one after another.
	pub fn new(ledger: Arc<dyn LedgerClient>, concurrency: usize) -> Self {
		Self {
			ledger,
			concurrency: concurrency.max(1),
		}
	}

	/// Pull every poll from the ledger.
	///
	/// Output order is ascending id regardless of `concurrency`; results are re-sequenced
	/// before they are returned.
	///
	/// # Errors
	/// Returns `SyncError::PollCount` if the count query fails. Per-id failures are not errors.
	pub async fn refresh_all(&self, account: Option<&Address>) -> Result<PollRefresh, SyncError> {
		let count = self
			.ledger
			.poll_count()
			.await
			.map_err(SyncError::PollCount)?;

		info!("Synchronizing {} polls", count);

		let account = account.copied();
		let outcomes: Vec<(u64, Result<Option<Poll>, LedgerError>)> = stream::iter(0..count)
			.map(move |id| async move { (id, self.fetch_poll(id, account.as_ref()).await) })
			.buffered(self.concurrency)
			.collect()
			.await;

		let mut stats = RefreshStats::new(count);
		let mut polls = Vec::with_capacity(outcomes.len());

		for (id, outcome) in outcomes {
			match outcome {
				Ok(Some(poll)) => {
					stats.record_synced();
					polls.push(poll);
				}
				Ok(None) => {
					debug!("Excluding invalid poll {}", id);
					stats.record_invalid(id);
				}
				Err(e) => {
					warn!("Skipping poll {}: {}", id, e);
					stats.record_skipped(id);
				}
			}
		}

		info!("Poll refresh: {}", stats.summary());
		Ok(PollRefresh { polls, stats })
	}

	async fn fetch_poll(
		&self,
		id: u64,
		account: Option<&Address>,
	) -> Result<Option<Poll>, LedgerError> {
		let raw = self.ledger.get_poll(id).await?;
		if !raw.is_valid() {
			return Ok(None);
		}

		let status = match account {
			Some(account) => self.fetch_vote_status(id, account).await?,
			None => VoteStatus::default(),
		};
		let expiry = self.ledger.get_expiry(id).await?;

		normalize_poll(id, raw, status, expiry)
	}

	async fn fetch_vote_status(&self, id: u64, account: &Address) -> Result<VoteStatus, LedgerError> {
		if !self.ledger.has_voted(id, account).await? {
			return Ok(VoteStatus::default());
		}

		let index = self.ledger.get_user_vote(id, account).await?;
		let user_vote = usize::try_from(index).map_err(|_| LedgerError::MalformedRecord {
			id,
			reason: format!("vote index {} out of range", index),
		})?;

		Ok(VoteStatus {
			has_voted: true,
			user_vote: Some(user_vote),
		})
	}
}
