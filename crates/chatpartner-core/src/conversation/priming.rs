//! The fixed priming triplet at the head of every conversation.

use chatpartner_types::config::BotSettings;
use chatpartner_types::message::{Message, MessageCategory, MessageRole};

use crate::llm::tokenizer::Tokenizer;

/// Number of config messages a primed conversation starts with.
pub const PRIMING_LEN: usize = 3;

/// System prompt, user self-introduction, assistant acknowledgement.
///
/// `username` must already be normalized. The introduction spells it with
/// spaces, the acknowledgement uses the first underscore-separated part.
pub fn priming_messages(
    bot: &BotSettings,
    chat_id: &str,
    username: &str,
    tokenizer: &dyn Tokenizer,
) -> Vec<Message> {
    let spoken_name = username.replace('_', " ");
    let first_name = username.split('_').next().unwrap_or_default();

    let system = Message::new(
        bot.rendered_system_prompt(),
        &bot.name,
        &bot.name,
        MessageRole::System,
        MessageCategory::Config,
        chat_id,
    );
    let introduction = Message::new(
        format!("{} {}", bot.my_name_is, spoken_name).trim_end().to_string(),
        username,
        &bot.name,
        MessageRole::User,
        MessageCategory::Config,
        chat_id,
    );
    let acknowledgement = Message::new(
        format!("{} {}", bot.i_will_call_you, first_name).trim_end().to_string(),
        &bot.name,
        username,
        MessageRole::Assistant,
        MessageCategory::Config,
        chat_id,
    );

    [system, introduction, acknowledgement]
        .into_iter()
        .map(|m| {
            let tokens = tokenizer.count(&m.content);
            m.with_token_count(tokens)
        })
        .collect()
}

/// Whether `messages` is exactly a priming triplet, in order.
pub fn is_priming(messages: &[Message]) -> bool {
    let roles = [MessageRole::System, MessageRole::User, MessageRole::Assistant];
    messages.len() == PRIMING_LEN
        && messages
            .iter()
            .zip(roles)
            .all(|(m, role)| m.category == MessageCategory::Config && m.role == role)
}
