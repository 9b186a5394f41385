//! Session-scoped application state and the read-only snapshots handed to presentation.

use super::draft::PollDraft;
use crate::feedback::FeedbackMessage;
use crate::ledger::Address;
use crate::sync::{LeaderboardEntry, Poll};
use crate::view::{FilterMode, filter_polls};

use serde::Serialize;
use std::sync::Arc;

/// Tickets for one refreshed collection.
///
/// Every refresh takes a ticket when it starts. Its result is committed only if no refresh
/// holding a newer ticket has committed first; a slower, older refresh is discarded instead of
/// overwriting fresher state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshGeneration {
	issued: u64,
	committed: u64,
}

impl RefreshGeneration {
	pub fn issue(&mut self) -> u64 {
		self.issued += 1;
		self.issued
	}

	/// Record `ticket` as committed if it is newer than the last commit.
	pub fn try_commit(&mut self, ticket: u64) -> bool {
		if ticket > self.committed {
			self.committed = ticket;
			true
		} else {
			false
		}
	}
}

/// All mutable session state. Only `PollSession` writes it.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
	pub active_account: Option<Address>,
	pub polls: Arc<Vec<Poll>>,
	pub leaderboard: Arc<Vec<LeaderboardEntry>>,
	pub search_query: String,
	pub filter_mode: FilterMode,
	pub draft: PollDraft,
	pub poll_generation: RefreshGeneration,
	pub leaderboard_generation: RefreshGeneration,
}

/// Immutable view of the session at one instant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
	pub active_account: Option<Address>,
	pub polls: Arc<Vec<Poll>>,
	pub leaderboard: Arc<Vec<LeaderboardEntry>>,
	pub search_query: String,
	pub filter_mode: FilterMode,
	pub draft: PollDraft,
	/// A mutating operation is in flight
	pub busy: bool,
	pub feedback: Option<FeedbackMessage>,
}

impl SessionSnapshot {
	/// Polls passing the current search text and filter mode at time `now`.
	pub fn visible_polls(&self, now: u64) -> Vec<&Poll> {
		filter_polls(
			&self.polls,
			&self.search_query,
			self.filter_mode,
			now,
			self.active_account.as_ref(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn older_ticket_cannot_overwrite_newer_commit() {
		let mut generation = RefreshGeneration::default();
		let first = generation.issue();
		let second = generation.issue();

		assert!(generation.try_commit(second));
		assert!(!generation.try_commit(first));
	}

	#[test]
	fn tickets_committing_in_order_all_land() {
		let mut generation = RefreshGeneration::default();
		let first = generation.issue();
		assert!(generation.try_commit(first));
		let second = generation.issue();
		assert!(generation.try_commit(second));
	}
}
