//! Mutating operations against the ledger.
//!
//! At most one vote or poll creation is in flight per session. The busy gate is held from
//! submission through confirmation and the follow-up resynchronization, and released on every
//! exit path. Read refreshes are never gated.

use crate::error::{ActionError, ValidationError};
use crate::ledger::{Address, LedgerClient, LedgerError, RevertReason, TxReceipt};
use crate::sync::Poll;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Re-synchronization hook run after a confirmed mutation.
#[async_trait::async_trait]
pub trait Resynchronize: Send + Sync {
	async fn resynchronize(&self);
}

/// Mutual-exclusion flag for mutating operations
#[derive(Debug, Default)]
pub struct BusyGate {
	busy: AtomicBool,
}

impl BusyGate {
	/// Take the gate, or `None` if a mutation is already in flight.
	pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
		self.busy
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| BusyGuard { gate: self })
	}

	pub fn is_busy(&self) -> bool {
		self.busy.load(Ordering::Acquire)
	}
}

/// Releases the gate when dropped.
pub struct BusyGuard<'a> {
	gate: &'a BusyGate,
}

impl Drop for BusyGuard<'_> {
	fn drop(&mut self) {
		self.gate.busy.store(false, Ordering::Release);
	}
}

/// Keep only non-blank option labels, in order.
pub fn non_blank_options(options: &[String]) -> Vec<String> {
	options
		.iter()
		.filter(|option| !option.trim().is_empty())
		.cloned()
		.collect()
}

pub struct VoteActionCoordinator {
	ledger: Arc<dyn LedgerClient>,
	gate: BusyGate,
}

impl VoteActionCoordinator {
	pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
		Self {
			ledger,
			gate: BusyGate::default(),
		}
	}

	pub fn is_busy(&self) -> bool {
		self.gate.is_busy()
	}

	/// Vote on `poll` and resynchronize once the ledger confirms.
	///
	/// # Errors
	/// * `Validation` if `option_index` is outside the poll's options; nothing is sent.
	/// * `Busy` if another mutation is in flight.
	/// * `DuplicateVote` if the ledger refused because the sender already voted.
	/// * `Transaction` for any other submission or confirmation failure.
	pub async fn submit_vote(
		&self,
		resync: &dyn Resynchronize,
		sender: &Address,
		poll: &Poll,
		option_index: usize,
	) -> Result<TxReceipt, ActionError> {
		if option_index >= poll.options.len() {
			return Err(ValidationError::OptionOutOfRange {
				poll_id: poll.id,
				option_index,
				option_count: poll.options.len(),
			}
			.into());
		}

		let _guard = self.gate.try_acquire().ok_or(ActionError::Busy)?;

		info!(
			"Voting on poll {} for option {} as {}",
			poll.id, option_index, sender
		);

		let receipt = self
			.submit_and_confirm(async {
				let tx = self
					.ledger
					.vote(sender, poll.id, option_index as u64)
					.await?;
				self.ledger.wait_for_confirmation(&tx).await
			})
			.await?;

		resync.resynchronize().await;
		Ok(receipt)
	}

	/// Create a poll and resynchronize once the ledger confirms.
	///
	/// Blank option labels are dropped before validation.
	///
	/// # Errors
	/// * `Validation` if the question is blank or fewer than 2 options remain; nothing is sent.
	/// * `Busy` if another mutation is in flight.
	/// * `Transaction` for any submission or confirmation failure.
	pub async fn create_poll(
		&self,
		resync: &dyn Resynchronize,
		sender: &Address,
		question: &str,
		options: &[String],
		expiry_days: u32,
	) -> Result<TxReceipt, ActionError> {
		if question.trim().is_empty() {
			return Err(ValidationError::EmptyQuestion.into());
		}
		let options = non_blank_options(options);
		if options.len() < 2 {
			return Err(ValidationError::TooFewOptions {
				provided: options.len(),
			}
			.into());
		}

		let _guard = self.gate.try_acquire().ok_or(ActionError::Busy)?;

		info!(
			"Creating poll '{}' with {} options, expiring in {} days",
			question,
			options.len(),
			expiry_days
		);

		let receipt = self
			.submit_and_confirm(async {
				let tx = self
					.ledger
					.create_poll(sender, question, &options, expiry_days)
					.await?;
				self.ledger.wait_for_confirmation(&tx).await
			})
			.await?;

		resync.resynchronize().await;
		Ok(receipt)
	}

	async fn submit_and_confirm(
		&self,
		submission: impl Future<Output = Result<TxReceipt, LedgerError>>,
	) -> Result<TxReceipt, ActionError> {
		submission.await.map_err(|e| {
			warn!("Mutating call failed: {}", e);
			match e.revert_reason() {
				Some(RevertReason::AlreadyVoted) => ActionError::DuplicateVote,
				_ => ActionError::Transaction(e),
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sync::PollSynchronizer;
	use crate::testing::{MockLedger, address, raw_poll};
	use std::sync::atomic::AtomicUsize;

	#[derive(Default)]
	struct CountingResync(AtomicUsize);

	#[async_trait::async_trait]
	impl Resynchronize for CountingResync {
		async fn resynchronize(&self) {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}

	async fn first_poll(ledger: &Arc<MockLedger>) -> Poll {
		PollSynchronizer::new(ledger.clone(), 1)
			.refresh_all(None)
			.await
			.unwrap()
			.polls
			.remove(0)
	}

	fn ledger() -> Arc<MockLedger> {
		Arc::new(MockLedger::new().with_poll(raw_poll("Q", &["a", "b", "c"], address(1)), 5_000))
	}

	#[test]
	fn gate_admits_one_holder() {
		let gate = BusyGate::default();
		let guard = gate.try_acquire().unwrap();
		assert!(gate.is_busy());
		assert!(gate.try_acquire().is_none());
		drop(guard);
		assert!(!gate.is_busy());
		assert!(gate.try_acquire().is_some());
	}

	#[tokio::test]
	async fn out_of_range_option_never_reaches_the_ledger() {
		let ledger = ledger();
		let poll = first_poll(&ledger).await;
		let resync = CountingResync::default();
		let coordinator = VoteActionCoordinator::new(ledger.clone());

		let result = coordinator
			.submit_vote(&resync, &address(9), &poll, 5)
			.await;

		assert!(matches!(
			result,
			Err(ActionError::Validation(ValidationError::OptionOutOfRange {
				option_index: 5,
				option_count: 3,
				..
			}))
		));
		assert_eq!(ledger.mutating_calls(), 0);
		assert_eq!(resync.0.load(Ordering::SeqCst), 0);
		assert!(!coordinator.is_busy());
	}

	#[tokio::test]
	async fn too_few_options_never_reaches_the_ledger() {
		let ledger = ledger();
		let resync = CountingResync::default();
		let coordinator = VoteActionCoordinator::new(ledger.clone());
		let options = vec!["only".to_string(), "   ".to_string(), String::new()];

		let result = coordinator
			.create_poll(&resync, &address(9), "Q?", &options, 7)
			.await;

		assert!(matches!(
			result,
			Err(ActionError::Validation(ValidationError::TooFewOptions { provided: 1 }))
		));
		assert_eq!(ledger.mutating_calls(), 0);
	}

	#[tokio::test]
	async fn confirmed_vote_triggers_resync() {
		let ledger = ledger();
		let poll = first_poll(&ledger).await;
		let resync = CountingResync::default();
		let coordinator = VoteActionCoordinator::new(ledger.clone());

		coordinator
			.submit_vote(&resync, &address(9), &poll, 1)
			.await
			.unwrap();

		assert_eq!(ledger.mutating_calls(), 1);
		assert_eq!(resync.0.load(Ordering::SeqCst), 1);
		assert!(!coordinator.is_busy());
	}

	#[tokio::test]
	async fn duplicate_vote_is_classified_and_releases_gate() {
		let ledger = ledger();
		ledger.record_vote(0, address(9), 0);
		let poll = first_poll(&ledger).await;
		let resync = CountingResync::default();
		let coordinator = VoteActionCoordinator::new(ledger.clone());

		let result = coordinator
			.submit_vote(&resync, &address(9), &poll, 1)
			.await;

		assert!(matches!(result, Err(ActionError::DuplicateVote)));
		assert_eq!(resync.0.load(Ordering::SeqCst), 0);
		assert!(!coordinator.is_busy());
	}

	#[tokio::test]
	async fn blank_options_are_dropped_before_submission() {
		let ledger = ledger();
		let resync = CountingResync::default();
		let coordinator = VoteActionCoordinator::new(ledger.clone());
		let options = vec![
			"yes".to_string(),
			" ".to_string(),
			"no".to_string(),
		];

		coordinator
			.create_poll(&resync, &address(9), "New?", &options, 7)
			.await
			.unwrap();

		let refresh = PollSynchronizer::new(ledger.clone(), 1)
			.refresh_all(None)
			.await
			.unwrap();
		let created = refresh.polls.last().unwrap();
		assert_eq!(created.question, "New?");
		assert_eq!(created.options, vec!["yes", "no"]);
		assert_eq!(created.creator, address(9));
	}
}
