use std::time::Duration;

/// Address of the deployed poll contract used when none is configured.
pub const DEFAULT_CONTRACT: &str = "0x3B16D40b779eBed2e4bdaD80A0F9bC0E930833C5";

/// Lifetime of every poll created through this client, in days.
pub const POLL_EXPIRY_DAYS: u32 = 7;

/// Library-facing settings for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Per-id fetches in flight during a poll refresh; 1 is strictly sequential
	pub fetch_concurrency: usize,
	/// How long a feedback message stays visible
	pub feedback_ttl: Duration,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			fetch_concurrency: 1,
			feedback_ttl: Duration::from_secs(3),
		}
	}
}
