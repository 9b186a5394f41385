//! Normalized entities produced by synchronization

use crate::ledger::{Address, LedgerError, RawPoll};
use serde::Serialize;

/// A poll as mirrored into the local view.
///
/// Only constructed from a valid ledger record: non-empty question, non-zero creator, at least
/// two options with one vote count each, and counts summing to `total_votes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
	pub id: u64,
	pub question: String,
	pub options: Vec<String>,
	pub vote_counts: Vec<u64>,
	pub total_votes: u64,
	pub creator: Address,
	pub active: bool,
	/// Seconds since the epoch.
	pub expiry: u64,
	/// Whether the account active during the refresh has voted.
	pub has_voted: bool,
	/// Option index chosen by that account, when `has_voted` is set.
	pub user_vote: Option<usize>,
}

impl Poll {
	/// Accepts the open window only while the ledger flags the poll active and it has not expired.
	pub fn is_open_at(&self, now: u64) -> bool {
		self.active && self.expiry > now
	}

	pub fn is_created_by(&self, account: Option<&Address>) -> bool {
		account.is_some_and(|account| self.creator == *account)
	}

	/// Share of the total for one option, in `0.0..=1.0`.
	pub fn vote_share(&self, option_index: usize) -> f64 {
		let count = self.vote_counts.get(option_index).copied().unwrap_or(0);
		count as f64 / self.total_votes.max(1) as f64
	}

	pub fn voted_option(&self) -> Option<&str> {
		self.user_vote
			.and_then(|index| self.options.get(index))
			.map(String::as_str)
	}
}

/// Per-account voting status fetched alongside a poll record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteStatus {
	pub has_voted: bool,
	pub user_vote: Option<usize>,
}

/// Build a `Poll` from a ledger record.
///
/// Returns `Ok(None)` for an invalid record, which is excluded without error, and
/// `Err(MalformedRecord)` when the record breaks the tally invariants.
pub fn normalize_poll(
	id: u64,
	raw: RawPoll,
	status: VoteStatus,
	expiry: u64,
) -> Result<Option<Poll>, LedgerError> {
	if !raw.is_valid() {
		return Ok(None);
	}
	raw.check_tallies()
		.map_err(|reason| LedgerError::MalformedRecord { id, reason })?;

	Ok(Some(Poll {
		id,
		question: raw.question,
		options: raw.options,
		vote_counts: raw.vote_counts,
		total_votes: raw.total_votes,
		creator: raw.creator,
		active: raw.active,
		expiry,
		has_voted: status.has_voted,
		user_vote: status.user_vote,
	}))
}

/// A ranked leaderboard row. Order is whatever the ledger returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
	pub id: u64,
	pub question: String,
	pub total_votes: u64,
}

/// Errors that abort a whole refresh
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("Poll count query failed: {0}")]
	PollCount(#[source] LedgerError),

	#[error("Leaderboard query failed: {0}")]
	Leaderboard(#[source] LedgerError),
}
