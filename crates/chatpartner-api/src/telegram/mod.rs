//! Telegram front-end over teloxide long polling.
//!
//! Updates are mapped to `InboundEvent`s and routed through the core
//! `EventRouter`. Each update is handled on its own; the dispatcher may run
//! handlers of different chats concurrently.

pub mod handlers;

use std::sync::Arc;

use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use chatpartner_core::channel::router::EventRouter;
use chatpartner_infra::config::{TELEGRAM_BOT_TOKEN_ENV, require_secret};
use chatpartner_infra::image::OpenAiImageGenerator;
use chatpartner_infra::sqlite::conversation::SqliteConversationRepository;
use chatpartner_infra::sqlite::system_log::SqliteSystemLog;

use crate::state::AppState;

use self::handlers::Command;

pub type ConcreteRouter =
    EventRouter<SqliteConversationRepository, SqliteSystemLog, OpenAiImageGenerator>;

/// Poll Telegram until Ctrl+C.
pub async fn run_telegram(state: &AppState) -> anyhow::Result<()> {
    let token = require_secret(TELEGRAM_BOT_TOKEN_ENV)?;
    let chat = Arc::new(state.chat_service()?);
    let pictures = Arc::new(state.picture_service()?);
    let router = EventRouter::new(Arc::clone(&chat), pictures);
    let config = chat.config();

    let bot = Bot::new(token.expose_secret());

    // Fails fast on a bad token or an unreachable API.
    let me = bot.get_me().await?;
    info!(username = ?me.user.username, "telegram bot connected");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    chat.announce_start().await?;
    println!("{}", config.telegram.render_started(&config.bot.name));

    Dispatcher::builder(bot, handlers::build_handler())
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    chat.announce_stop().await?;
    println!("{}", config.telegram.render_stopped(&config.bot.name));
    Ok(())
}
