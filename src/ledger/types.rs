//! Types for the poll contract integration

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account or contract address.
///
/// Parsing accepts either hex case, so two addresses that differ only in letter case
/// compare equal once parsed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
	/// The all-zero address the contract reports for a poll slot with no creator.
	pub const ZERO: Address = Address([0u8; 20]);

	pub fn from_bytes(bytes: [u8; 20]) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; 20] {
		&self.0
	}

	pub fn is_zero(&self) -> bool {
		self.0 == [0u8; 20]
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

impl fmt::Debug for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
	#[error("invalid hex in address: {0}")]
	InvalidHex(#[from] hex::FromHexError),

	#[error("address must be 20 bytes, got {0}")]
	InvalidLength(usize),
}

impl FromStr for Address {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let digits = s
			.strip_prefix("0x")
			.or_else(|| s.strip_prefix("0X"))
			.unwrap_or(s);
		let bytes = hex::decode(digits)?;
		let bytes: [u8; 20] = bytes
			.as_slice()
			.try_into()
			.map_err(|_| AddressError::InvalidLength(bytes.len()))?;
		Ok(Self(bytes))
	}
}

impl Serialize for Address {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Address {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// A poll record exactly as the contract's `getPoll` returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPoll {
	pub question: String,
	pub options: Vec<String>,
	pub vote_counts: Vec<u64>,
	pub total_votes: u64,
	pub creator: Address,
	pub active: bool,
}

impl RawPoll {
	/// Empty question or zero creator marks a slot the contract never populated.
	pub fn is_valid(&self) -> bool {
		!self.question.is_empty() && !self.creator.is_zero()
	}

	/// Check the structural invariants the engine relies on for display.
	pub fn check_tallies(&self) -> Result<(), String> {
		if self.options.len() < 2 {
			return Err(format!("{} options, at least 2 required", self.options.len()));
		}
		if self.options.len() != self.vote_counts.len() {
			return Err(format!(
				"{} options but {} vote counts",
				self.options.len(),
				self.vote_counts.len()
			));
		}
		let sum = self
			.vote_counts
			.iter()
			.try_fold(0u64, |acc, count| acc.checked_add(*count))
			.ok_or_else(|| "vote counts overflow".to_string())?;
		if sum != self.total_votes {
			return Err(format!(
				"vote counts sum to {} but total is {}",
				sum, self.total_votes
			));
		}
		Ok(())
	}
}

/// Handle for a submitted, not yet confirmed, transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHandle {
	pub hash: String,
}

impl fmt::Display for TxHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.hash)
	}
}

/// Confirmation data for a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
	pub hash: String,
	pub block_number: Option<u64>,
}

/// Why the contract refused a mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
	/// The sender has already voted on this poll
	AlreadyVoted,
	/// Any other revert, with the node's message
	Other(String),
}

impl RevertReason {
	const ALREADY_VOTED: &'static str = "already voted";

	/// Classify the node's revert text. This is the only place revert text is inspected.
	pub fn from_message(message: &str) -> Self {
		if message.to_lowercase().contains(Self::ALREADY_VOTED) {
			RevertReason::AlreadyVoted
		} else {
			RevertReason::Other(message.to_string())
		}
	}
}

impl fmt::Display for RevertReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RevertReason::AlreadyVoted => f.write_str(Self::ALREADY_VOTED),
			RevertReason::Other(message) => f.write_str(message),
		}
	}
}

/// Error types for ledger reads and transaction submission
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("RPC error {code}: {message}")]
	RpcError { code: i64, message: String },

	#[error("ABI decode error: {0}")]
	AbiError(String),

	#[error("Transaction reverted: {0}")]
	Reverted(RevertReason),

	#[error("Transaction {0} still pending")]
	Pending(String),

	#[error("Transaction {0} was not confirmed in time")]
	ConfirmationTimeout(String),

	#[error("Malformed poll record {id}: {reason}")]
	MalformedRecord { id: u64, reason: String },

	#[error("No data returned")]
	NoData,
}

impl LedgerError {
	/// The structured revert reason, if the ledger refused the call.
	pub fn revert_reason(&self) -> Option<&RevertReason> {
		match self {
			LedgerError::Reverted(reason) => Some(reason),
			_ => None,
		}
	}
}
