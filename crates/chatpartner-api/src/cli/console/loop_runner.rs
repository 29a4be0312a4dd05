//! Console chat loop.
//!
//! One fixed chat id (`system_console`) with the normalized
//! `bot.local_username` as sender. Each prompt is either a console command
//! or a turn through `ChatService::process_message`.

use std::io::Write;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline_async::SharedWriter;
use tracing::info;

use chatpartner_core::username::normalize_username;
use chatpartner_types::message::CONSOLE_CHAT_ID;

use crate::state::{AppState, ConcreteChatService};

use super::commands::{self, ConsoleCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ReplyRenderer;

/// Run the interactive console chat until the user quits.
pub async fn run_console(state: &AppState) -> anyhow::Result<()> {
    let chat = state.chat_service()?;
    let config = chat.config();
    let username = normalize_username(&config.bot.local_username);
    let renderer = ReplyRenderer::new();

    chat.announce_start().await?;
    info!(chat_id = CONSOLE_CHAT_ID, username = %username, "console chat started");

    let prompt = format!("{} ", style(format!("{} >", username)).green().bold());
    let (mut input, mut out) = ChatInput::new(prompt, "  ".to_string())
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    print_banner(&mut out, state, &chat)?;
    writeln!(out, "{}", renderer.separator())?;

    loop {
        let text = match input.read_prompt().await {
            InputEvent::Message(text) => text,
            InputEvent::Eof | InputEvent::Interrupted => {
                stop(&chat, &mut out).await?;
                break;
            }
        };

        match commands::parse(&text) {
            Some(ConsoleCommand::Quit) => {
                stop(&chat, &mut out).await?;
                break;
            }
            Some(ConsoleCommand::Reset) => {
                let notice = chat.reset(CONSOLE_CHAT_ID, &username).await?;
                writeln!(out, "{notice}")?;
            }
            None => {
                let message = chat.user_message(CONSOLE_CHAT_ID, &username, &text);

                let spinner = thinking_spinner();
                let reply = chat.process_message(message).await;
                spinner.finish_and_clear();

                let reply = reply?;
                write!(out, "{}", renderer.render(&reply.content))?;
            }
        }
        writeln!(out, "{}", renderer.separator())?;
    }

    input.flush();
    Ok(())
}

async fn stop(chat: &ConcreteChatService, out: &mut SharedWriter) -> anyhow::Result<()> {
    chat.announce_stop().await?;
    writeln!(out, "{}", chat.config().notices.bye)?;
    info!(chat_id = CONSOLE_CHAT_ID, "console chat stopped");
    Ok(())
}

fn print_banner(
    out: &mut SharedWriter,
    state: &AppState,
    chat: &ConcreteChatService,
) -> anyhow::Result<()> {
    let config = chat.config();
    writeln!(out)?;
    writeln!(out, "  {}", style(&config.bot.name).cyan().bold())?;
    writeln!(
        out,
        "  {}  {} via {}",
        style("Model:").bold(),
        style(&config.llm.model).dim(),
        style(chat.provider_name()).dim()
    )?;
    writeln!(
        out,
        "  {}  {}",
        style("Data:").bold(),
        style(state.data_dir.display()).dim()
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "  {}",
        style("End a prompt with an empty line. /reset starts over, /quit leaves.").dim()
    )?;
    Ok(())
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
