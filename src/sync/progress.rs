//! Outcome accounting for a single refresh.
//!
//! Records which ids made it into the view, which were excluded as invalid and which were
//! skipped after a fetch failure, and renders a one-line summary for the log.

/// Statistics about one refresh pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
	/// Number of ids the ledger reported
	pub total: u64,
	/// Ids mirrored into the view
	pub synced: usize,
	/// Ids excluded as invalid records
	pub invalid: Vec<u64>,
	/// Ids skipped because a fetch failed or the record was malformed
	pub skipped: Vec<u64>,
}

impl RefreshStats {
	pub fn new(total: u64) -> Self {
		Self {
			total,
			..Self::default()
		}
	}

	pub fn record_synced(&mut self) {
		self.synced += 1;
	}

	pub fn record_invalid(&mut self, id: u64) {
		self.invalid.push(id);
	}

	pub fn record_skipped(&mut self, id: u64) {
		self.skipped.push(id);
	}

	/// True when at least one id was dropped because of a fetch failure.
	pub fn is_partial(&self) -> bool {
		!self.skipped.is_empty()
	}

	/// Get a human-readable summary of the refresh
	pub fn summary(&self) -> String {
		format!(
			"{} of {} synced, {} invalid{}",
			self.synced,
			self.total,
			self.invalid.len(),
			if self.skipped.is_empty() {
				String::new()
			} else {
				format!(", {} skipped {:?}", self.skipped.len(), self.skipped)
			}
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn summary_mentions_skipped_ids_only_when_present() {
		let mut stats = RefreshStats::new(3);
		stats.record_synced();
		stats.record_invalid(1);
		assert_eq!(stats.summary(), "1 of 3 synced, 1 invalid");
		assert!(!stats.is_partial());

		stats.record_skipped(2);
		assert_eq!(stats.summary(), "1 of 3 synced, 1 invalid, 1 skipped [2]");
		assert!(stats.is_partial());
	}
}
