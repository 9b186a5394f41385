//! In-memory ledger and wallet doubles for unit tests.

use crate::ledger::*;
use crate::session::{PollSession, SessionSnapshot};
use crate::utils::unix_now;
use crate::wallet::{AccountStream, WalletError, WalletProvider};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};

pub fn address(byte: u8) -> Address {
	Address::from_bytes([byte; 20])
}

pub fn raw_poll(question: &str, options: &[&str], creator: Address) -> RawPoll {
	RawPoll {
		question: question.to_string(),
		options: options.iter().map(|o| o.to_string()).collect(),
		vote_counts: vec![0; options.len()],
		total_votes: 0,
		creator,
		active: true,
	}
}

enum PendingOp {
	Vote {
		sender: Address,
		poll_id: u64,
		option_index: u64,
	},
	Create {
		sender: Address,
		question: String,
		options: Vec<String>,
		expiry_days: u32,
	},
}

#[derive(Default)]
struct MockState {
	polls: Vec<(RawPoll, u64)>,
	votes: HashMap<(u64, Address), u64>,
	failing_polls: HashSet<u64>,
	fail_count: bool,
	fail_leaderboard: bool,
	leaderboard: Vec<u64>,
	pending: HashMap<String, PendingOp>,
	next_tx: u64,
	confirm_gate: Option<Arc<Notify>>,
}

/// Ledger double that applies transactions on confirmation.
#[derive(Default)]
pub struct MockLedger {
	state: Mutex<MockState>,
	mutating_calls: AtomicUsize,
}

impl MockLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_poll(self, raw: RawPoll, expiry: u64) -> Self {
		self.push_poll(raw, expiry);
		self
	}

	pub fn push_poll(&self, raw: RawPoll, expiry: u64) {
		self.state.lock().unwrap().polls.push((raw, expiry));
	}

	pub fn record_vote(&self, poll_id: u64, voter: Address, option_index: u64) {
		let mut state = self.state.lock().unwrap();
		let (raw, _) = &mut state.polls[poll_id as usize];
		raw.vote_counts[option_index as usize] += 1;
		raw.total_votes += 1;
		state.votes.insert((poll_id, voter), option_index);
	}

	pub fn set_leaderboard(&self, ids: Vec<u64>) {
		self.state.lock().unwrap().leaderboard = ids;
	}

	pub fn fail_poll(&self, poll_id: u64) {
		self.state.lock().unwrap().failing_polls.insert(poll_id);
	}

	pub fn set_fail_count(&self, fail: bool) {
		self.state.lock().unwrap().fail_count = fail;
	}

	pub fn set_fail_leaderboard(&self, fail: bool) {
		self.state.lock().unwrap().fail_leaderboard = fail;
	}

	/// Make confirmations wait until the returned `Notify` is signalled.
	pub fn hold_confirmations(&self) -> Arc<Notify> {
		let gate = Arc::new(Notify::new());
		self.state.lock().unwrap().confirm_gate = Some(gate.clone());
		gate
	}

	pub fn mutating_calls(&self) -> usize {
		self.mutating_calls.load(Ordering::SeqCst)
	}

	fn submit(&self, op: PendingOp) -> TxHandle {
		self.mutating_calls.fetch_add(1, Ordering::SeqCst);
		let mut state = self.state.lock().unwrap();
		state.next_tx += 1;
		let hash = format!("0x{:064x}", state.next_tx);
		state.pending.insert(hash.clone(), op);
		TxHandle { hash }
	}

	fn rpc_failure(what: &str) -> LedgerError {
		LedgerError::RpcError {
			code: -32000,
			message: format!("{} unavailable", what),
		}
	}
}

#[async_trait::async_trait]
impl LedgerClient for MockLedger {
	async fn poll_count(&self) -> Result<u64, LedgerError> {
		let state = self.state.lock().unwrap();
		if state.fail_count {
			return Err(Self::rpc_failure("poll count"));
		}
		Ok(state.polls.len() as u64)
	}

	async fn get_poll(&self, poll_id: u64) -> Result<RawPoll, LedgerError> {
		let state = self.state.lock().unwrap();
		if state.failing_polls.contains(&poll_id) {
			return Err(Self::rpc_failure("poll record"));
		}
		state
			.polls
			.get(poll_id as usize)
			.map(|(raw, _)| raw.clone())
			.ok_or(LedgerError::NoData)
	}

	async fn has_voted(&self, poll_id: u64, voter: &Address) -> Result<bool, LedgerError> {
		Ok(self
			.state
			.lock()
			.unwrap()
			.votes
			.contains_key(&(poll_id, *voter)))
	}

	async fn get_user_vote(&self, poll_id: u64, voter: &Address) -> Result<u64, LedgerError> {
		self.state
			.lock()
			.unwrap()
			.votes
			.get(&(poll_id, *voter))
			.copied()
			.ok_or(LedgerError::NoData)
	}

	async fn get_expiry(&self, poll_id: u64) -> Result<u64, LedgerError> {
		self.state
			.lock()
			.unwrap()
			.polls
			.get(poll_id as usize)
			.map(|(_, expiry)| *expiry)
			.ok_or(LedgerError::NoData)
	}

	async fn get_leaderboard(&self) -> Result<Vec<u64>, LedgerError> {
		let state = self.state.lock().unwrap();
		if state.fail_leaderboard {
			return Err(Self::rpc_failure("leaderboard"));
		}
		Ok(state.leaderboard.clone())
	}

	async fn create_poll(
		&self,
		sender: &Address,
		question: &str,
		options: &[String],
		expiry_days: u32,
	) -> Result<TxHandle, LedgerError> {
		Ok(self.submit(PendingOp::Create {
			sender: *sender,
			question: question.to_string(),
			options: options.to_vec(),
			expiry_days,
		}))
	}

	async fn vote(
		&self,
		sender: &Address,
		poll_id: u64,
		option_index: u64,
	) -> Result<TxHandle, LedgerError> {
		Ok(self.submit(PendingOp::Vote {
			sender: *sender,
			poll_id,
			option_index,
		}))
	}

	async fn wait_for_confirmation(&self, tx: &TxHandle) -> Result<TxReceipt, LedgerError> {
		let gate = self.state.lock().unwrap().confirm_gate.clone();
		if let Some(gate) = gate {
			gate.notified().await;
		}

		let mut state = self.state.lock().unwrap();
		let op = state
			.pending
			.remove(&tx.hash)
			.ok_or_else(|| LedgerError::Pending(tx.hash.clone()))?;

		match op {
			PendingOp::Vote {
				sender,
				poll_id,
				option_index,
			} => {
				if state.votes.contains_key(&(poll_id, sender)) {
					return Err(LedgerError::Reverted(RevertReason::AlreadyVoted));
				}
				let (raw, _) = state
					.polls
					.get_mut(poll_id as usize)
					.ok_or_else(|| LedgerError::Reverted(RevertReason::Other("no poll".into())))?;
				let slot = raw
					.vote_counts
					.get_mut(option_index as usize)
					.ok_or_else(|| LedgerError::Reverted(RevertReason::Other("bad option".into())))?;
				*slot += 1;
				raw.total_votes += 1;
				state.votes.insert((poll_id, sender), option_index);
			}
			PendingOp::Create {
				sender,
				question,
				options,
				expiry_days,
			} => {
				let mut raw = raw_poll(&question, &[], sender);
				raw.vote_counts = vec![0; options.len()];
				raw.options = options;
				let expiry = unix_now() + u64::from(expiry_days) * 86_400;
				state.polls.push((raw, expiry));
			}
		}

		Ok(TxReceipt {
			hash: tx.hash.clone(),
			block_number: Some(state.next_tx),
		})
	}
}

/// Wallet double whose account notifications are pushed by the test.
#[derive(Default)]
pub struct MockWallet {
	accounts: Mutex<Vec<Address>>,
	reject: Mutex<bool>,
	subscribers: Mutex<Vec<mpsc::UnboundedSender<Vec<Address>>>>,
}

impl MockWallet {
	pub fn with_accounts(accounts: Vec<Address>) -> Self {
		Self {
			accounts: Mutex::new(accounts),
			..Self::default()
		}
	}

	pub fn set_reject(&self, reject: bool) {
		*self.reject.lock().unwrap() = reject;
	}

	/// Switch accounts and notify every live subscriber.
	pub fn emit(&self, accounts: Vec<Address>) {
		*self.accounts.lock().unwrap() = accounts.clone();
		self.subscribers
			.lock()
			.unwrap()
			.retain(|tx| tx.send(accounts.clone()).is_ok());
	}

	pub fn live_subscribers(&self) -> usize {
		let mut subscribers = self.subscribers.lock().unwrap();
		subscribers.retain(|tx| !tx.is_closed());
		subscribers.len()
	}
}

#[async_trait::async_trait]
impl WalletProvider for MockWallet {
	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		if *self.reject.lock().unwrap() {
			return Err(WalletError::Rejected("user rejected the request".to_string()));
		}
		Ok(self.accounts.lock().unwrap().clone())
	}

	async fn subscribe_accounts(&self) -> Result<AccountStream, WalletError> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.subscribers.lock().unwrap().push(tx);
		let stream = futures_util::stream::unfold(rx, |mut rx| async move {
			rx.recv().await.map(|accounts| (accounts, rx))
		});
		Ok(Box::pin(stream))
	}
}

/// Wait until a committed session state satisfies `condition`.
pub async fn wait_until(
	session: &PollSession,
	condition: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
	let mut changes = session.subscribe_changes();
	tokio::time::timeout(std::time::Duration::from_secs(5), async {
		loop {
			let snapshot = session.snapshot().await;
			if condition(&snapshot) {
				return snapshot;
			}
			changes.changed().await.unwrap();
		}
	})
	.await
	.expect("session never reached the expected state")
}
