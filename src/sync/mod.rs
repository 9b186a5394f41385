//! Read paths from the ledger into the local view.
//!
//! Two independent synchronizers pull state: `PollSynchronizer` for the full poll set and
//! `LeaderboardSynchronizer` for the ranking. Neither failure affects the other.
//! `AccountWatcher` re-runs both when the wallet switches identity.

pub mod account_watcher;
pub mod leaderboard;
pub mod polls;
pub mod progress;
pub mod types;

pub use account_watcher::{AccountWatcher, AccountWatcherHandle};
pub use leaderboard::LeaderboardSynchronizer;
pub use polls::{PollRefresh, PollSynchronizer};
pub use progress::RefreshStats;
pub use types::{LeaderboardEntry, Poll, SyncError, VoteStatus, normalize_poll};
