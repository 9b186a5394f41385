//! Derivation of the displayed poll subset.
//!
//! Pure: the same inputs always select the same polls, in their input order.

use crate::ledger::Address;
use crate::sync::Poll;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
	/// Every synchronized poll
	#[default]
	All,
	/// Polls created by the active account
	Yours,
	/// Polls flagged active whose expiry is still in the future
	Active,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown filter mode '{0}', expected one of: all, yours, active")]
pub struct UnknownFilterMode(String);

impl FromStr for FilterMode {
	type Err = UnknownFilterMode;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"all" => Ok(FilterMode::All),
			"yours" => Ok(FilterMode::Yours),
			"active" => Ok(FilterMode::Active),
			_ => Err(UnknownFilterMode(s.to_string())),
		}
	}
}

impl fmt::Display for FilterMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			FilterMode::All => "all",
			FilterMode::Yours => "yours",
			FilterMode::Active => "active",
		})
	}
}

impl FilterMode {
	fn matches(self, poll: &Poll, now: u64, account: Option<&Address>) -> bool {
		match self {
			FilterMode::All => true,
			FilterMode::Yours => poll.is_created_by(account),
			FilterMode::Active => poll.is_open_at(now),
		}
	}
}

/// Select the polls matching both the search text and the filter mode.
///
/// Search is a case-insensitive substring match on the question; an empty query matches
/// everything. `now` is in seconds since the epoch.
pub fn filter_polls<'a>(
	polls: &'a [Poll],
	search_query: &str,
	mode: FilterMode,
	now: u64,
	account: Option<&Address>,
) -> Vec<&'a Poll> {
	let needle = search_query.to_lowercase();
	polls
		.iter()
		.filter(|poll| poll.question.to_lowercase().contains(&needle))
		.filter(|poll| mode.matches(poll, now, account))
		.collect()
}
