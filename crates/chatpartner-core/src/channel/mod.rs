//! Platform-neutral inbound events and outbound replies.
//!
//! A messaging adapter turns platform updates into [`InboundEvent`]s and
//! sends back whatever [`router::EventRouter`] answers.

pub mod router;

use std::path::PathBuf;

/// Kind of chat an event arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// One-to-one chat with the bot.
    Private,
    /// Group, supergroup or channel.
    Group,
}

/// Commands a messaging user can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    Start,
    Reset,
    Help,
    /// Generate an image from the (possibly empty) prompt.
    Picture(String),
}

/// An event from a messaging platform.
///
/// `display_name` is the raw name shown by the platform; the router
/// normalizes it before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        chat_id: String,
        display_name: String,
        /// Ready-made HTML link to the sender, when the platform has one.
        mention_html: Option<String>,
        command: InboundCommand,
    },
    Text {
        chat_id: String,
        display_name: String,
        text: String,
        chat_kind: ChatKind,
        /// The message replies to the bot or mentions it.
        addressed_to_bot: bool,
    },
}

/// What to send back to the chat an event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundReply {
    Text(String),
    /// Text carrying HTML markup.
    Html(String),
    Image { path: PathBuf, caption: String },
}

/// Check if the bot was @mentioned in the message text.
pub fn mentions_bot(text: &str, bot_username: Option<&str>) -> bool {
    match bot_username {
        Some(username) if !username.is_empty() => text
            .to_lowercase()
            .contains(&format!("@{}", username.to_lowercase())),
        _ => false,
    }
}

/// Escape text for an HTML reply.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Private chats are always answered, groups only when the bot is addressed.
pub fn should_respond(chat_kind: ChatKind, addressed_to_bot: bool) -> bool {
    match chat_kind {
        ChatKind::Private => true,
        ChatKind::Group => addressed_to_bot,
    }
}
