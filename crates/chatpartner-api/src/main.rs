//! ChatPartner entry point.
//!
//! Binary name: `chatpartner`
//!
//! Parses CLI arguments, sets up tracing, opens storage, then dispatches to
//! the console chat, the Telegram adapter, or one of the one-shot commands.

mod cli;
mod retry;
mod state;
mod telegram;

use clap::Parser;
use clap_complete::generate;

use chatpartner_infra::config::load_dotenv;
use chatpartner_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A .env may carry RUST_LOG, so load it before the subscriber reads the filter.
    load_dotenv();

    init_tracing(&TracingOptions {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        json: cli.log_json,
        otel_stdout: cli.otel_stdout,
    })
    .map_err(|e| anyhow::anyhow!(e))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::Console);

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chatpartner", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.data_dir.as_deref(), cli.database_url.as_deref()).await?;
    let max_tries = state.config.runtime.connection_max_tries;
    let notice = state.config.notices.connection_error.clone();

    let result = match command {
        Commands::Console => {
            retry::with_retries(max_tries, &notice, || cli::console::run_console(&state)).await
        }
        Commands::Telegram => {
            retry::with_retries(max_tries, &notice, || telegram::run_telegram(&state)).await
        }
        Commands::Picture { prompt } => cli::picture::create_picture(&state, &prompt).await,
        Commands::History { chat_id, json } => {
            cli::history::show_history(&state, &chat_id, json).await
        }
        Commands::Log {
            chat_id,
            limit,
            json,
        } => cli::history::show_log(&state, chat_id.as_deref(), limit, json).await,
        Commands::Completions { .. } => Ok(()),
    };

    state.pool.close().await;
    result
}
