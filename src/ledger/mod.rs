//! Ledger integration module for the poll contract
//!
//! This module defines the `LedgerClient` capability the engine consumes, the raw record and
//! error types it exchanges, and a JSON-RPC implementation against a deployed contract.
//! The ledger is authoritative: nothing here recomputes tallies or enforces eligibility.

/// Contract ABI encoding and decoding
pub mod abi;
/// JSON-RPC client for the poll contract
mod client;
/// JSON-RPC transport
pub mod rpc;
/// Type definitions for ledger data structures
mod types;

pub use client::RpcPollContract;
pub use rpc::RpcTransport;
pub use types::*;

/// Read and write operations against the poll contract.
///
/// Every method is a suspension point. Mutations return a handle as soon as the node accepts
/// the transaction; `wait_for_confirmation` resolves once it is mined or has failed.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
	/// Number of poll slots; ids are dense in `0..count`.
	async fn poll_count(&self) -> Result<u64, LedgerError>;

	async fn get_poll(&self, poll_id: u64) -> Result<RawPoll, LedgerError>;

	async fn has_voted(&self, poll_id: u64, voter: &Address) -> Result<bool, LedgerError>;

	/// Only meaningful when `has_voted` is true.
	async fn get_user_vote(&self, poll_id: u64, voter: &Address) -> Result<u64, LedgerError>;

	/// Expiry timestamp in seconds since the epoch.
	async fn get_expiry(&self, poll_id: u64) -> Result<u64, LedgerError>;

	/// Poll ids in the ledger's ranking order.
	async fn get_leaderboard(&self) -> Result<Vec<u64>, LedgerError>;

	async fn create_poll(
		&self,
		sender: &Address,
		question: &str,
		options: &[String],
		expiry_days: u32,
	) -> Result<TxHandle, LedgerError>;

	async fn vote(
		&self,
		sender: &Address,
		poll_id: u64,
		option_index: u64,
	) -> Result<TxHandle, LedgerError>;

	async fn wait_for_confirmation(&self, tx: &TxHandle) -> Result<TxReceipt, LedgerError>;
}
