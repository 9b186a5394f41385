//!
//! JSON-RPC client for the poll contract.
//!
//! Reads go through `eth_call`; mutations go through `eth_sendTransaction` from a node-managed
//! account and are confirmed by polling `eth_getTransactionReceipt` with exponential backoff.

use super::LedgerClient;
use super::abi::{Decoder, Token, encode_call};
use super::rpc::{RpcTransport, parse_quantity};
use super::types::*;
use backoff::{ExponentialBackoff, future::retry};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Poll contract bound to a deployed address
#[derive(Clone)]
pub struct RpcPollContract {
	transport: RpcTransport,
	contract: Address,
	/// Upper bound on how long a submitted transaction is polled for.
	confirm_timeout: Duration,
}

impl RpcPollContract {
	pub fn new(transport: RpcTransport, contract: Address, confirm_timeout: Duration) -> Self {
		Self {
			transport,
			contract,
			confirm_timeout,
		}
	}

	async fn call(&self, calldata: Vec<u8>) -> Result<Vec<u8>, LedgerError> {
		let result = self
			.transport
			.request(
				"eth_call",
				json!([
					{
						"to": self.contract.to_string(),
						"data": format!("0x{}", hex::encode(calldata)),
					},
					"latest"
				]),
			)
			.await?;

		let encoded = result
			.as_str()
			.and_then(|s| s.strip_prefix("0x"))
			.ok_or(LedgerError::NoData)?;
		hex::decode(encoded).map_err(|e| LedgerError::AbiError(format!("invalid hex: {}", e)))
	}

	async fn send_transaction(
		&self,
		sender: &Address,
		calldata: Vec<u8>,
	) -> Result<TxHandle, LedgerError> {
		let result = self
			.transport
			.request(
				"eth_sendTransaction",
				json!([{
					"from": sender.to_string(),
					"to": self.contract.to_string(),
					"data": format!("0x{}", hex::encode(calldata)),
				}]),
			)
			.await
			.map_err(classify_send_error)?;

		let hash = result.as_str().ok_or(LedgerError::NoData)?.to_string();
		info!("Submitted transaction {} from {}", hash, sender);
		Ok(TxHandle { hash })
	}
}

/// Nodes report a revert during gas estimation as an RPC error whose message carries the
/// contract's reason string.
fn classify_send_error(error: LedgerError) -> LedgerError {
	match error {
		LedgerError::RpcError { message, .. } if message.contains("revert") => {
			LedgerError::Reverted(RevertReason::from_message(&message))
		}
		other => other,
	}
}

#[async_trait::async_trait]
impl LedgerClient for RpcPollContract {
	async fn poll_count(&self) -> Result<u64, LedgerError> {
		let data = self.call(encode_call("getPollCount()", &[])).await?;
		Decoder::new(&data).uint(0)
	}

	async fn get_poll(&self, poll_id: u64) -> Result<RawPoll, LedgerError> {
		let data = self
			.call(encode_call("getPoll(uint256)", &[Token::Uint(poll_id)]))
			.await?;
		let decoder = Decoder::new(&data);

		Ok(RawPoll {
			question: decoder.string(0)?,
			options: decoder.string_array(1)?,
			vote_counts: decoder.uint_array(2)?,
			total_votes: decoder.uint(3)?,
			creator: decoder.address(4)?,
			active: decoder.bool(5)?,
		})
	}

	async fn has_voted(&self, poll_id: u64, voter: &Address) -> Result<bool, LedgerError> {
		let data = self
			.call(encode_call(
				"hasVoted(uint256,address)",
				&[Token::Uint(poll_id), Token::Address(*voter)],
			))
			.await?;
		Decoder::new(&data).bool(0)
	}

	async fn get_user_vote(&self, poll_id: u64, voter: &Address) -> Result<u64, LedgerError> {
		let data = self
			.call(encode_call(
				"getUserVote(uint256,address)",
				&[Token::Uint(poll_id), Token::Address(*voter)],
			))
			.await?;
		Decoder::new(&data).uint(0)
	}

	async fn get_expiry(&self, poll_id: u64) -> Result<u64, LedgerError> {
		let data = self
			.call(encode_call("pollExpiries(uint256)", &[Token::Uint(poll_id)]))
			.await?;
		Decoder::new(&data).uint(0)
	}

	async fn get_leaderboard(&self) -> Result<Vec<u64>, LedgerError> {
		let data = self.call(encode_call("getLeaderboard()", &[])).await?;
		Decoder::new(&data).uint_array(0)
	}

	async fn create_poll(
		&self,
		sender: &Address,
		question: &str,
		options: &[String],
		expiry_days: u32,
	) -> Result<TxHandle, LedgerError> {
		let calldata = encode_call(
			"createPoll(string,string[],uint256)",
			&[
				Token::String(question.to_string()),
				Token::StringArray(options.to_vec()),
				Token::Uint(u64::from(expiry_days)),
			],
		);
		self.send_transaction(sender, calldata).await
	}

	async fn vote(
		&self,
		sender: &Address,
		poll_id: u64,
		option_index: u64,
	) -> Result<TxHandle, LedgerError> {
		let calldata = encode_call(
			"vote(uint256,uint256)",
			&[Token::Uint(poll_id), Token::Uint(option_index)],
		);
		self.send_transaction(sender, calldata).await
	}

	async fn wait_for_confirmation(&self, tx: &TxHandle) -> Result<TxReceipt, LedgerError> {
		let transport = &self.transport;
		let hash = tx.hash.as_str();
		let policy = ExponentialBackoff {
			initial_interval: Duration::from_millis(500),
			max_interval: Duration::from_secs(5),
			max_elapsed_time: Some(self.confirm_timeout),
			..ExponentialBackoff::default()
		};

		let receipt = retry(policy, || async move {
			let receipt = transport
				.request("eth_getTransactionReceipt", json!([hash]))
				.await
				.map_err(|e| match e {
					LedgerError::HttpError(_) => {
						warn!("Receipt query for {} failed, retrying: {}", hash, e);
						backoff::Error::transient(e)
					}
					other => backoff::Error::permanent(other),
				})?;

			if receipt.is_null() {
				debug!("Transaction {} not yet mined", hash);
				return Err(backoff::Error::transient(LedgerError::Pending(
					hash.to_string(),
				)));
			}

			Ok::<serde_json::Value, backoff::Error<LedgerError>>(receipt)
		})
		.await
		.map_err(|e| match e {
			LedgerError::Pending(hash) => LedgerError::ConfirmationTimeout(hash),
			other => other,
		})?;

		let block_number = receipt.get("blockNumber").and_then(parse_quantity);
		match receipt.get("status").and_then(parse_quantity) {
			Some(1) => {
				info!("Transaction {} confirmed in block {:?}", hash, block_number);
				Ok(TxReceipt {
					hash: hash.to_string(),
					block_number,
				})
			}
			status => {
				warn!("Transaction {} failed with status {:?}", hash, status);
				Err(LedgerError::Reverted(RevertReason::Other(format!(
					"transaction {} reverted on-chain",
					hash
				))))
			}
		}
	}
}
