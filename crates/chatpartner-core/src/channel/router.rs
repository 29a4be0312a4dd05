//! Maps inbound platform events onto the chat and picture services.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{InboundCommand, InboundEvent, OutboundReply, escape_html, should_respond};
use crate::chat::ChatError;
use crate::chat::service::ChatService;
use crate::conversation::repository::{ConversationRepository, SystemLogRepository};
use crate::picture::{ImageGenerator, PictureService};
use crate::username::normalize_username;

/// Routes inbound events of one messaging adapter.
///
/// Every event is handled on its own: the conversation is re-read from
/// storage, so concurrent events on one chat are ordered by the store alone.
pub struct EventRouter<C, L, G>
where
    C: ConversationRepository,
    L: SystemLogRepository,
    G: ImageGenerator,
{
    chat: Arc<ChatService<C, L>>,
    pictures: Arc<PictureService<G>>,
}

impl<C, L, G> Clone for EventRouter<C, L, G>
where
    C: ConversationRepository,
    L: SystemLogRepository,
    G: ImageGenerator,
{
    fn clone(&self) -> Self {
        Self {
            chat: Arc::clone(&self.chat),
            pictures: Arc::clone(&self.pictures),
        }
    }
}

impl<C, L, G> EventRouter<C, L, G>
where
    C: ConversationRepository,
    L: SystemLogRepository,
    G: ImageGenerator,
{
    pub fn new(chat: Arc<ChatService<C, L>>, pictures: Arc<PictureService<G>>) -> Self {
        Self { chat, pictures }
    }

    pub fn chat(&self) -> &ChatService<C, L> {
        &self.chat
    }

    /// Handle one event. `None` means the event is ignored.
    pub async fn route(&self, event: InboundEvent) -> Result<Option<OutboundReply>, ChatError> {
        match event {
            InboundEvent::Command {
                chat_id,
                display_name,
                mention_html,
                command,
            } => self
                .command(&chat_id, &display_name, mention_html.as_deref(), command)
                .await
                .map(Some),
            InboundEvent::Text {
                chat_id,
                display_name,
                text,
                chat_kind,
                addressed_to_bot,
            } => {
                if !should_respond(chat_kind, addressed_to_bot) {
                    debug!(chat_id, "group message not addressed to the bot, ignoring");
                    return Ok(None);
                }
                let username = normalize_username(&display_name);
                let message = self.chat.user_message(&chat_id, &username, &text);
                let reply = self.chat.process_message(message).await?;
                Ok(Some(OutboundReply::Text(reply.content)))
            }
        }
    }

    async fn command(
        &self,
        chat_id: &str,
        display_name: &str,
        mention_html: Option<&str>,
        command: InboundCommand,
    ) -> Result<OutboundReply, ChatError> {
        let config = self.chat.config();
        let telegram = &config.telegram;
        match command {
            InboundCommand::Start => Ok(match mention_html {
                Some(mention) => OutboundReply::Html(telegram.render_start(
                    mention,
                    &escape_html(&config.bot.name),
                    &escape_html(&config.llm.model),
                )),
                None => OutboundReply::Text(telegram.render_start(
                    display_name,
                    &config.bot.name,
                    &config.llm.model,
                )),
            }),
            InboundCommand::Help => Ok(OutboundReply::Text(telegram.help_message.clone())),
            InboundCommand::Reset => {
                let username = normalize_username(display_name);
                let notice = self.chat.reset(chat_id, &username).await?;
                Ok(OutboundReply::Text(notice))
            }
            InboundCommand::Picture(prompt) => {
                if prompt.trim().is_empty() {
                    return Ok(OutboundReply::Text(telegram.picture_usage.clone()));
                }
                match self.pictures.create(&prompt).await {
                    Ok(image) => Ok(OutboundReply::Image {
                        path: image.path,
                        caption: telegram.image_caption.clone(),
                    }),
                    Err(err) => {
                        warn!(chat_id, error = %err, "picture generation failed");
                        Ok(OutboundReply::Text(format!("{} {}", telegram.picture_failed, err)))
                    }
                }
            }
        }
    }
}
