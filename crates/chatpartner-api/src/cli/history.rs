//! Inspection commands: stored transcripts and the audit log.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use chatpartner_core::conversation::repository::{ConversationRepository, SystemLogRepository};
use chatpartner_types::message::{Message, MessageCategory, MessageRole};

use crate::state::AppState;

/// Longest content shown in a table cell.
const PREVIEW_CHARS: usize = 80;

/// Print the transcript of one chat, config rows first.
pub async fn show_history(state: &AppState, chat_id: &str, json: bool) -> anyhow::Result<()> {
    let conversation = state.conversations.load(chat_id).await?;
    let messages = conversation.into_messages();

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No messages stored for chat {}",
            style("i").blue().bold(),
            style(chat_id).yellow()
        );
        println!();
        return Ok(());
    }

    let total: u32 = messages.iter().map(|m| m.token_count).sum();
    println!("{}", message_table(&messages));
    println!(
        "  {} messages, {} tokens",
        style(messages.len()).bold(),
        style(total).bold()
    );
    Ok(())
}

/// Print the most recent audit entries, newest first.
pub async fn show_log(
    state: &AppState,
    chat_id: Option<&str>,
    limit: u32,
    json: bool,
) -> anyhow::Result<()> {
    let entries = state.system_log.entries(chat_id, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!("  {} The audit log is empty.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    println!("{}", message_table(&entries));
    Ok(())
}

fn message_table(messages: &[Message]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Time").fg(Color::White),
        Cell::new("Chat").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Category").fg(Color::White),
        Cell::new("Sender").fg(Color::White),
        Cell::new("Tokens").fg(Color::White),
        Cell::new("Content").fg(Color::White),
    ]);

    for message in messages {
        let id = message.id.map(|id| id.to_string()).unwrap_or_default();
        let role_cell = match message.role {
            MessageRole::System => Cell::new("system").fg(Color::Yellow),
            MessageRole::User => Cell::new("user").fg(Color::Green),
            MessageRole::Assistant => Cell::new("assistant").fg(Color::Cyan),
        };
        let category_cell = match message.category {
            MessageCategory::Config => Cell::new("config").fg(Color::DarkGrey),
            other => Cell::new(other.to_string()),
        };

        table.add_row(vec![
            Cell::new(id).fg(Color::DarkGrey),
            Cell::new(message.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(&message.chat_id),
            role_cell,
            category_cell,
            Cell::new(&message.sender),
            Cell::new(message.token_count),
            Cell::new(preview(&message.content)),
        ]);
    }

    table
}

fn preview(content: &str) -> String {
    let single_line = content.replace('\n', " ");
    if single_line.chars().count() > PREVIEW_CHARS {
        let cut: String = single_line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        single_line
    }
}
