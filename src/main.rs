mod cli;

use clap::Parser;
use poll_ledger_sync::PollSession;
use poll_ledger_sync::ledger::{RpcPollContract, RpcTransport};
use poll_ledger_sync::sync::AccountWatcher;
use poll_ledger_sync::wallet::NodeWallet;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use crate::cli::{Cli, CliError, Command, fill_draft, print_feedback, print_leaderboard, print_polls};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive("poll_ledger_sync=debug".parse().expect("static directive"))
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.with_writer(std::io::stderr)
		.init();

	let cli = Cli::parse();

	match run(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{}", e);
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> Result<(), CliError> {
	let config = cli.config;
	info!(
		"Using contract {} via {}",
		config.contract, config.rpc_url
	);

	let transport = RpcTransport::new(config.rpc_url.clone())?;
	let ledger = Arc::new(RpcPollContract::new(
		transport.clone(),
		config.contract,
		config.confirm_timeout(),
	));
	let wallet = Arc::new(NodeWallet::new(transport, config.account_poll_interval()));
	let session = Arc::new(PollSession::new(ledger, wallet, config.engine()));

	// A failed connection leaves the session read-only; mutations report it themselves
	let _ = session.connect().await;

	let result = match cli.command {
		Command::Polls { search, filter } => {
			session.set_search(search).await;
			session.set_filter(filter).await;
			print_polls(&session, config.json).await
		}
		Command::Leaderboard => print_leaderboard(&session, config.json).await,
		Command::Vote {
			poll_id,
			option_index,
		} => match session.vote(poll_id, option_index).await {
			Ok(_) => print_polls(&session, config.json).await,
			Err(e) => Err(e.into()),
		},
		Command::Create { question, options } => {
			fill_draft(&session, &question, &options).await;
			match session.submit_draft().await {
				Ok(_) => print_polls(&session, config.json).await,
				Err(e) => Err(e.into()),
			}
		}
		Command::Watch { search, filter } => {
			session.set_search(search).await;
			session.set_filter(filter).await;
			watch(&session, config.json).await
		}
	};

	print_feedback(&session);
	result
}

async fn watch(session: &Arc<PollSession>, json: bool) -> Result<(), CliError> {
	let handle = AccountWatcher::spawn(session.clone()).await?;
	let mut changes = session.subscribe_changes();
	print_polls(session, json).await?;

	let result = loop {
		tokio::select! {
			signal = tokio::signal::ctrl_c() => {
				break signal.map_err(CliError::from);
			}
			changed = changes.changed() => {
				if changed.is_err() {
					break Ok(());
				}
				print_feedback(session);
				if let Err(e) = print_polls(session, json).await {
					break Err(e);
				}
			}
		}
	};

	handle.unsubscribe().await;
	result
}
