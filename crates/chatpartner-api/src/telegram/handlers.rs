//! Update handlers: teloxide messages in, `OutboundReply`s out.

use teloxide::dispatching::{DpHandlerDescription, UpdateFilterExt};
use teloxide::payloads::{SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, Me, ParseMode};
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;
use tracing::{debug, info};

use chatpartner_core::channel::{ChatKind, InboundCommand, InboundEvent, OutboundReply, mentions_bot};

use super::ConcreteRouter;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Bot commands, registered with Telegram for autocomplete.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "say hello")]
    Start,
    #[command(description = "forget our conversation")]
    Reset,
    #[command(description = "show this help")]
    Help,
    #[command(description = "generate an image: /pic <prompt>")]
    Pic(String),
}

impl From<Command> for InboundCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => InboundCommand::Start,
            Command::Reset => InboundCommand::Reset,
            Command::Help => InboundCommand::Help,
            Command::Pic(prompt) => InboundCommand::Picture(prompt),
        }
    }
}

/// Build the teloxide update handler: commands first, then plain text.
pub fn build_handler() -> Handler<'static, DependencyMap, HandlerResult, DpHandlerDescription> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_text))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    command: Command,
    router: ConcreteRouter,
) -> HandlerResult {
    let display_name = display_name(&msg);
    info!(chat_id = msg.chat.id.0, user = %display_name, ?command, "telegram command");

    let event = InboundEvent::Command {
        chat_id: msg.chat.id.0.to_string(),
        mention_html: mention_html(&msg),
        display_name,
        command: command.into(),
    };
    if let Some(reply) = router.route(event).await? {
        send_reply(&bot, msg.chat.id, reply).await?;
    }
    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, me: Me, router: ConcreteRouter) -> HandlerResult {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    if text.starts_with('/') {
        debug!(chat_id = msg.chat.id.0, "ignoring unknown command");
        return Ok(());
    }

    let chat_kind = chat_kind(&msg.chat.kind);
    let replies_to_bot = msg
        .reply_to_message()
        .and_then(|original| original.from.as_ref())
        .is_some_and(|author| author.id == me.user.id);
    let addressed_to_bot = replies_to_bot || mentions_bot(text, me.user.username.as_deref());

    let display_name = display_name(&msg);
    debug!(
        chat_id = msg.chat.id.0,
        user = %display_name,
        ?chat_kind,
        addressed_to_bot,
        "telegram text"
    );

    let event = InboundEvent::Text {
        chat_id: msg.chat.id.0.to_string(),
        display_name,
        text: text.to_string(),
        chat_kind,
        addressed_to_bot,
    };
    if let Some(reply) = router.route(event).await? {
        send_reply(&bot, msg.chat.id, reply).await?;
    }
    Ok(())
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: OutboundReply) -> HandlerResult {
    match reply {
        OutboundReply::Text(text) => {
            // Telegram rejects empty messages.
            if !text.trim().is_empty() {
                bot.send_message(chat_id, text).await?;
            }
        }
        OutboundReply::Html(text) => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        OutboundReply::Image { path, caption } => {
            bot.send_photo(chat_id, InputFile::file(path))
                .caption(caption)
                .await?;
        }
    }
    Ok(())
}

/// Full name of the sender, as the conversation username is derived from it.
fn display_name(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map(|user| user.full_name())
        .unwrap_or_default()
}

/// HTML link to the sender's profile, labelled with their full name.
fn mention_html(msg: &Message) -> Option<String> {
    msg.from
        .as_ref()
        .map(|user| html::user_mention(user.id, &html::escape(&user.full_name())))
}

fn chat_kind(kind: &teloxide::types::ChatKind) -> ChatKind {
    match kind {
        teloxide::types::ChatKind::Private(_) => ChatKind::Private,
        teloxide::types::ChatKind::Public(_) => ChatKind::Group,
    }
}
