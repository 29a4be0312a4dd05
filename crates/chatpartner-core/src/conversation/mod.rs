//! Transient conversation view.
//!
//! A `Conversation` is rebuilt from storage on every turn. It keeps the
//! priming messages (category `config`) apart from the running history so
//! that the config prefix always precedes the user messages.

pub mod budget;
pub mod priming;
pub mod repository;
pub mod summarizer;

use chatpartner_types::llm::LlmMessage;
use chatpartner_types::message::{Message, MessageCategory};

use self::priming::PRIMING_LEN;
use crate::username::normalize_username;

/// Ordered config messages followed by ordered user/assistant messages for
/// one chat id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    chat_id: String,
    config_messages: Vec<Message>,
    user_messages: Vec<Message>,
}

impl Conversation {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            config_messages: Vec::new(),
            user_messages: Vec::new(),
        }
    }

    /// Build a view from stored rows (in id order).
    ///
    /// Config rows are pulled to the front regardless of position. Rows of
    /// the log categories carry no conversation content and are skipped.
    pub fn from_messages(chat_id: impl Into<String>, messages: Vec<Message>) -> Self {
        let mut conversation = Self::new(chat_id);
        for message in messages {
            conversation.push(message);
        }
        conversation
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn config_messages(&self) -> &[Message] {
        &self.config_messages
    }

    pub fn user_messages(&self) -> &[Message] {
        &self.user_messages
    }

    /// Config prefix then history, in send order.
    pub fn full_messages(&self) -> impl Iterator<Item = &Message> {
        self.config_messages.iter().chain(self.user_messages.iter())
    }

    /// Whether the priming triplet is in place.
    pub fn is_primed(&self) -> bool {
        self.config_messages.len() == PRIMING_LEN
    }

    /// Replace the config prefix.
    pub fn set_config(&mut self, messages: Vec<Message>) {
        self.config_messages = messages;
    }

    /// Append a message to the bucket matching its category.
    pub fn push(&mut self, message: Message) {
        match message.category {
            MessageCategory::Config => self.config_messages.push(message),
            MessageCategory::User => self.user_messages.push(message),
            MessageCategory::Log | MessageCategory::SystemLog => {}
        }
    }

    /// Remove and return the most recent user/assistant message.
    pub fn pop_user(&mut self) -> Option<Message> {
        self.user_messages.pop()
    }

    pub fn last_user_message_mut(&mut self) -> Option<&mut Message> {
        self.user_messages.last_mut()
    }

    pub fn config_count(&self) -> usize {
        self.config_messages.len()
    }

    pub fn user_count(&self) -> usize {
        self.user_messages.len()
    }

    pub fn len(&self) -> usize {
        self.config_count() + self.user_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config_tokens(&self) -> u32 {
        self.config_messages.iter().map(|m| m.token_count).sum()
    }

    pub fn user_tokens(&self) -> u32 {
        self.user_messages.iter().map(|m| m.token_count).sum()
    }

    pub fn total_tokens(&self) -> u32 {
        self.config_tokens() + self.user_tokens()
    }

    /// Wire messages for the completion backend.
    ///
    /// Participant names are normalized here as well, since the bot name
    /// comes straight from the config file.
    pub fn to_llm_messages(&self) -> Vec<LlmMessage> {
        self.full_messages()
            .map(|message| {
                let mut wire = message.to_llm_message();
                wire.name = wire
                    .name
                    .map(|name| normalize_username(&name))
                    .filter(|name| !name.is_empty());
                wire
            })
            .collect()
    }

    /// Consume the view, yielding every message in send order.
    pub fn into_messages(self) -> Vec<Message> {
        let mut messages = self.config_messages;
        messages.extend(self.user_messages);
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatpartner_types::message::MessageRole;

    fn msg(content: &str, role: MessageRole, category: MessageCategory, tokens: u32) -> Message {
        Message::new(content, "Ada", "Bot", role, category, "42").with_token_count(tokens)
    }

    #[test]
    fn test_config_always_precedes_history() {
        let conversation = Conversation::from_messages(
            "42",
            vec![
                msg("hi", MessageRole::User, MessageCategory::User, 2),
                msg("prompt", MessageRole::System, MessageCategory::Config, 5),
                msg("hello", MessageRole::Assistant, MessageCategory::User, 3),
            ],
        );
        let order: Vec<&str> = conversation.full_messages().map(|m| m.content.as_str()).collect();
        assert_eq!(order, vec!["prompt", "hi", "hello"]);
    }

    #[test]
    fn test_log_rows_are_not_part_of_the_view() {
        let conversation = Conversation::from_messages(
            "42",
            vec![
                msg("prompt", MessageRole::System, MessageCategory::Config, 5),
                msg("*** started ***", MessageRole::System, MessageCategory::Log, 0),
            ],
        );
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_total_tokens_is_sum_of_messages() {
        let mut conversation = Conversation::new("42");
        conversation.push(msg("prompt", MessageRole::System, MessageCategory::Config, 5));
        conversation.push(msg("hi", MessageRole::User, MessageCategory::User, 2));
        conversation.push(msg("hello", MessageRole::Assistant, MessageCategory::User, 3));
        assert_eq!(conversation.config_tokens(), 5);
        assert_eq!(conversation.user_tokens(), 5);
        assert_eq!(conversation.total_tokens(), 10);
    }

    #[test]
    fn test_pop_user_leaves_config_alone() {
        let mut conversation = Conversation::new("42");
        conversation.push(msg("prompt", MessageRole::System, MessageCategory::Config, 5));
        assert!(conversation.pop_user().is_none());
        conversation.push(msg("hi", MessageRole::User, MessageCategory::User, 2));
        assert_eq!(conversation.pop_user().map(|m| m.content), Some("hi".to_string()));
        assert_eq!(conversation.config_count(), 1);
        assert_eq!(conversation.user_count(), 0);
    }

    #[test]
    fn test_to_llm_messages_order_and_roles() {
        let mut conversation = Conversation::new("42");
        conversation.push(msg("hi", MessageRole::User, MessageCategory::User, 2));
        conversation.push(msg("prompt", MessageRole::System, MessageCategory::Config, 5));
        let wire = conversation.to_llm_messages();
        assert_eq!(wire[0].role, MessageRole::System);
        assert_eq!(wire[1].role, MessageRole::User);
    }

    #[test]
    fn test_to_llm_messages_normalizes_names() {
        let mut conversation = Conversation::new("42");
        conversation.push(
            Message::new("hello", "Chat Partner", "Ada", MessageRole::Assistant, MessageCategory::User, "42"),
        );
        conversation.push(
            Message::new("hi", "李小龍", "Chat Partner", MessageRole::User, MessageCategory::User, "42"),
        );
        let wire = conversation.to_llm_messages();
        assert_eq!(wire[0].name.as_deref(), Some("Chat_Partner"));
        assert_eq!(wire[1].name, None);
    }
}
