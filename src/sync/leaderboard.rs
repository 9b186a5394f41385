//! Leaderboard synchronization.
//!
//! The ledger ranks; this side only resolves each ranked id to its question and total.

use crate::ledger::LedgerClient;
use crate::sync::progress::RefreshStats;
use crate::sync::types::{LeaderboardEntry, SyncError};

use std::sync::Arc;
use tracing::{info, warn};

pub struct LeaderboardSynchronizer {
	ledger: Arc<dyn LedgerClient>,
}

impl LeaderboardSynchronizer {
	pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
		Self { ledger }
	}

	/// Fetch the ranked entries in ledger order.
	///
	/// # Errors
	/// Returns `SyncError::Leaderboard` if the ranking query fails. An entry whose record
	/// cannot be read is skipped.
	pub async fn refresh_leaderboard(
		&self,
	) -> Result<(Vec<LeaderboardEntry>, RefreshStats), SyncError> {
		let ranked = self
			.ledger
			.get_leaderboard()
			.await
			.map_err(SyncError::Leaderboard)?;

		let mut stats = RefreshStats::new(ranked.len() as u64);
		let mut entries = Vec::with_capacity(ranked.len());

		for id in ranked {
			match self.ledger.get_poll(id).await {
				Ok(raw) => {
					stats.record_synced();
					entries.push(LeaderboardEntry {
						id,
						question: raw.question,
						total_votes: raw.total_votes,
					});
				}
				Err(e) => {
					warn!("Skipping leaderboard entry {}: {}", id, e);
					stats.record_skipped(id);
				}
			}
		}

		info!("Leaderboard refresh: {}", stats.summary());
		Ok((entries, stats))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{MockLedger, address, raw_poll};

	fn ledger() -> Arc<MockLedger> {
		let ledger = Arc::new(
			MockLedger::new()
				.with_poll(raw_poll("Zero", &["a", "b"], address(1)), 1_000)
				.with_poll(raw_poll("One", &["a", "b"], address(1)), 1_000)
				.with_poll(raw_poll("Two", &["a", "b"], address(1)), 1_000),
		);
		ledger.record_vote(0, address(2), 0);
		ledger.record_vote(2, address(2), 1);
		ledger.record_vote(2, address(3), 1);
		ledger
	}

	#[tokio::test]
	async fn keeps_ledger_ranking() {
		let ledger = ledger();
		// Deliberately not sorted by votes
		ledger.set_leaderboard(vec![1, 2, 0]);
		let (entries, _) = LeaderboardSynchronizer::new(ledger)
			.refresh_leaderboard()
			.await
			.unwrap();

		let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
		assert_eq!(ids, vec![1, 2, 0]);
		assert_eq!(entries[1].question, "Two");
		assert_eq!(entries[1].total_votes, 2);
	}

	#[tokio::test]
	async fn ranking_failure_is_an_error() {
		let ledger = ledger();
		ledger.set_fail_leaderboard(true);
		let result = LeaderboardSynchronizer::new(ledger).refresh_leaderboard().await;
		assert!(matches!(result, Err(SyncError::Leaderboard(_))));
	}

	#[tokio::test]
	async fn unreadable_entry_is_skipped() {
		let ledger = ledger();
		ledger.set_leaderboard(vec![2, 0, 1]);
		ledger.fail_poll(0);
		let (entries, stats) = LeaderboardSynchronizer::new(ledger)
			.refresh_leaderboard()
			.await
			.unwrap();

		let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
		assert_eq!(ids, vec![2, 1]);
		assert_eq!(stats.skipped, vec![0]);
	}
}
