//! CLI command definitions for the `chatpartner` binary.
//!
//! Uses clap derive macros for argument parsing. Without a subcommand the
//! binary starts the console chat.

pub mod console;
pub mod history;
pub mod picture;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use chatpartner_infra::config::DATA_DIR_ENV;

/// Chat with a completion model from the terminal or Telegram.
#[derive(Parser)]
#[command(name = "chatpartner", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding config.toml and the database.
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Database URL (defaults to the SQLite file in the data directory).
    #[arg(long, global = true, env = "CHATPARTNER_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Suppress all diagnostics except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed diagnostics (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit diagnostics as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel_stdout: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat in the terminal (default).
    Console,

    /// Run as a Telegram bot (needs TELEGRAM_BOT_TOKEN).
    Telegram,

    /// Generate one image from a prompt and save it as a PNG.
    #[command(alias = "pic")]
    Picture {
        /// Words of the image prompt.
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Print the stored transcript of a chat.
    History {
        /// Chat id (the console uses `system_console`).
        chat_id: String,

        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print recent audit log entries.
    Log {
        /// Only entries of this chat id.
        chat_id: Option<String>,

        /// Maximum number of entries.
        #[arg(short, long, default_value = "20")]
        limit: u32,

        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
