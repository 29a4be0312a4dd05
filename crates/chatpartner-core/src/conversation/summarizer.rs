//! Truncation planning and summarization for overflowing conversations.
//!
//! When the token guard trips, the stored conversation is removed and its
//! user rows are split into three parts: the oldest turns, which are dropped,
//! a middle that gets condensed by one extra completion call, and a tail of
//! recent messages kept verbatim. Priming rows never take part.

use chatpartner_types::llm::{CompletionRequest, LlmError, LlmMessage, MessageRole};
use chatpartner_types::message::Message;

use crate::llm::box_provider::BoxLlmProvider;

/// Instruction that precedes the concatenated message bodies.
pub const SUMMARY_PROMPT: &str = "Summarize this conversation";

/// Prefix of the synthetic message that carries the summary.
pub const SUMMARY_PREFIX: &str = "Summary of the conversation so far:";

/// Oldest user rows, dropped without being summarized.
pub const KEEP_HEAD: usize = 3;

/// Trailing messages re-appended verbatim after the rebuild.
pub const KEEP_TAIL: usize = 3;

/// Below this many user rows there is nothing worth summarizing.
pub const MIN_MESSAGES_TO_SUMMARIZE: usize = KEEP_HEAD + KEEP_TAIL + 1;

/// What to do with a removed conversation.
#[derive(Debug, PartialEq)]
pub enum TruncationPlan<'a> {
    /// Too few messages: start over with a fresh priming triplet.
    Restart,
    /// Condense `middle`, then re-append `tail`.
    Summarize {
        middle: &'a [Message],
        tail: &'a [Message],
    },
}

/// Stateless utility for condensing the middle of a conversation.
pub struct ConversationSummarizer;

impl ConversationSummarizer {
    /// Split removed user rows (in id order) into a plan.
    pub fn plan(messages: &[Message]) -> TruncationPlan<'_> {
        if messages.len() < MIN_MESSAGES_TO_SUMMARIZE {
            return TruncationPlan::Restart;
        }
        let tail_start = messages.len() - KEEP_TAIL;
        TruncationPlan::Summarize {
            middle: &messages[KEEP_HEAD..tail_start],
            tail: &messages[tail_start..],
        }
    }

    /// Prompt text: the fixed instruction followed by the message bodies.
    pub fn build_prompt(messages: &[Message]) -> String {
        let bodies = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        format!("{SUMMARY_PROMPT}:\n\n{bodies}")
    }

    /// Ask the backend for a summary of `messages`.
    #[tracing::instrument(
        name = "summarize_conversation",
        skip(provider, messages),
        fields(
            model = %model,
            message_count = messages.len(),
        )
    )]
    pub async fn summarize(
        provider: &BoxLlmProvider,
        messages: &[Message],
        model: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        if messages.is_empty() {
            return Ok(String::new());
        }

        let request = CompletionRequest {
            model: model.to_string(),
            messages: vec![LlmMessage {
                role: MessageRole::User,
                content: Self::build_prompt(messages),
                name: None,
            }],
            max_tokens,
            temperature: Some(0.0),
        };

        let response = provider.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }

    /// Content of the synthetic summary message.
    pub fn summary_content(summary: &str) -> String {
        format!("{SUMMARY_PREFIX} {summary}")
    }
}
