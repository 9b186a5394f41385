use poll_ledger_sync::config::{DEFAULT_CONTRACT, EngineConfig};
use poll_ledger_sync::error::{ActionError, LedgerError, WalletError};
use poll_ledger_sync::feedback::FeedbackKind;
use poll_ledger_sync::ledger::Address;
use poll_ledger_sync::session::{MIN_OPTIONS, PollSession};
use poll_ledger_sync::sync::{LeaderboardEntry, Poll};
use poll_ledger_sync::utils::{short_address, unix_now};
use poll_ledger_sync::view::FilterMode;

use clap::{Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for an on-ledger poll contract", long_about = None)]
pub struct Cli {
	#[command(flatten)]
	pub config: Config,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
	/// JSON-RPC endpoint of the ledger node
	#[arg(long, env = "POLL_RPC_URL", default_value = "http://127.0.0.1:8545", global = true)]
	pub rpc_url: String,

	/// Address of the poll contract
	#[arg(long, env = "POLL_CONTRACT", default_value = DEFAULT_CONTRACT, global = true)]
	pub contract: Address,

	/// Per-poll fetches in flight during a refresh (1 = sequential)
	#[arg(long, env = "POLL_FETCH_CONCURRENCY", default_value_t = 1, global = true)]
	pub fetch_concurrency: usize,

	/// How long feedback messages stay visible, in milliseconds
	#[arg(long, env = "POLL_FEEDBACK_TTL_MS", default_value_t = 3000, global = true)]
	pub feedback_ttl_ms: u64,

	/// Wallet account polling interval, in milliseconds
	#[arg(long, env = "POLL_ACCOUNT_POLL_MS", default_value_t = 1000, global = true)]
	pub account_poll_ms: u64,

	/// Give up waiting for a transaction receipt after this many seconds
	#[arg(long, env = "POLL_CONFIRM_TIMEOUT_SECS", default_value_t = 120, global = true)]
	pub confirm_timeout_secs: u64,

	/// Print machine-readable JSON instead of text
	#[arg(long, global = true)]
	pub json: bool,
}

impl Config {
	pub fn engine(&self) -> EngineConfig {
		EngineConfig {
			fetch_concurrency: self.fetch_concurrency,
			feedback_ttl: Duration::from_millis(self.feedback_ttl_ms),
		}
	}

	pub fn account_poll_interval(&self) -> Duration {
		Duration::from_millis(self.account_poll_ms)
	}

	pub fn confirm_timeout(&self) -> Duration {
		Duration::from_secs(self.confirm_timeout_secs)
	}
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
	/// List polls
	Polls {
		/// Case-insensitive text the question must contain
		#[arg(long, default_value = "")]
		search: String,

		/// all, yours or active
		#[arg(long, default_value_t = FilterMode::All)]
		filter: FilterMode,
	},
	/// Show the most voted polls
	Leaderboard,
	/// Vote on a poll
	Vote { poll_id: u64, option_index: usize },
	/// Create a poll open for seven days
	Create {
		#[arg(long)]
		question: String,

		/// Repeat for each option
		#[arg(long = "option", required = true)]
		options: Vec<String>,
	},
	/// Follow wallet account changes until interrupted
	Watch {
		#[arg(long, default_value = "")]
		search: String,

		#[arg(long, default_value_t = FilterMode::All)]
		filter: FilterMode,
	},
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
	#[error("Ledger setup failed: {0}")]
	Ledger(#[from] LedgerError),

	#[error(transparent)]
	Wallet(#[from] WalletError),

	#[error(transparent)]
	Action(#[from] ActionError),

	#[error("Failed to encode output: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Failed to listen for Ctrl-C: {0}")]
	Signal(#[from] std::io::Error),
}

/// Copy the form fields into the session's authoring draft.
pub async fn fill_draft(session: &PollSession, question: &str, options: &[String]) {
	session.set_draft_question(question).await;
	for (index, option) in options.iter().enumerate() {
		if index >= MIN_OPTIONS {
			session.add_draft_option().await;
		}
		session.update_draft_option(index, option.as_str()).await;
	}
}

pub fn print_feedback(session: &PollSession) {
	if let Some(message) = session.feedback().current() {
		let tag = match message.kind {
			FeedbackKind::Success => "ok",
			FeedbackKind::Error => "error",
		};
		eprintln!("[{}] {}", tag, message.text);
	}
}

pub async fn print_polls(session: &PollSession, json: bool) -> Result<(), CliError> {
	let snapshot = session.snapshot().await;
	let now = unix_now();
	let visible = snapshot.visible_polls(now);

	if json {
		println!("{}", serde_json::to_string_pretty(&visible)?);
		return Ok(());
	}

	match snapshot.active_account {
		Some(account) => println!("Account {}", short_address(&account)),
		None => println!("No wallet connected (read-only)"),
	}
	if visible.is_empty() {
		println!("No polls match");
	}
	for poll in visible {
		println!("{}", render_poll(poll, now, snapshot.active_account.as_ref()));
	}
	Ok(())
}

pub async fn print_leaderboard(session: &PollSession, json: bool) -> Result<(), CliError> {
	let snapshot = session.snapshot().await;
	if json {
		println!("{}", serde_json::to_string_pretty(snapshot.leaderboard.as_ref())?);
		return Ok(());
	}
	if snapshot.leaderboard.is_empty() {
		println!("Leaderboard unavailable");
	}
	for (rank, entry) in snapshot.leaderboard.iter().enumerate() {
		println!("{}", render_entry(rank, entry));
	}
	Ok(())
}

fn render_poll(poll: &Poll, now: u64, account: Option<&Address>) -> String {
	let status = if poll.is_open_at(now) { "open" } else { "closed" };
	let mut out = format!(
		"#{} {} [{}] by {}{}",
		poll.id,
		poll.question,
		status,
		short_address(&poll.creator),
		if poll.is_created_by(account) { " (you)" } else { "" },
	);
	for (index, option) in poll.options.iter().enumerate() {
		let count = poll.vote_counts.get(index).copied().unwrap_or(0);
		let marker = if poll.user_vote == Some(index) { "  <- your vote" } else { "" };
		out.push_str(&format!(
			"\n   {}. {} {} votes ({:.0}%){}",
			index,
			option,
			count,
			poll.vote_share(index) * 100.0,
			marker,
		));
	}
	out
}

fn render_entry(rank: usize, entry: &LeaderboardEntry) -> String {
	format!(
		"{:>2}. {} ({} votes, poll #{})",
		rank + 1,
		entry.question,
		entry.total_votes,
		entry.id
	)
}
