//! Chat service orchestrating the conversation lifecycle for every front-end.
//!
//! ChatService coordinates the ConversationRepository, SystemLogRepository,
//! completion provider and tokenizer: it primes new conversations, guards the
//! token budget, rebuilds overflowing transcripts around a summary, and
//! records usage counters after every exchange.

use std::sync::Arc;

use chatpartner_types::config::ChatPartnerConfig;
use chatpartner_types::llm::CompletionRequest;
use chatpartner_types::message::{
    Message, MessageCategory, MessageRole, SYSTEM_LOG_CHAT_ID,
};
use tracing::{debug, info, warn};

use super::ChatError;
use crate::conversation::Conversation;
use crate::conversation::budget::{PREVIOUS_TURN_WINDOW, TokenGuard};
use crate::conversation::priming::priming_messages;
use crate::conversation::repository::{ConversationRepository, SystemLogRepository};
use crate::conversation::summarizer::{ConversationSummarizer, TruncationPlan};
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::tokenizer::Tokenizer;

/// Result of truncating an overflowing conversation.
#[derive(Debug)]
pub enum Truncation {
    /// Too short to summarize; only a fresh priming triplet is stored.
    Restarted,
    /// Priming, summary and the preserved tail, as stored.
    Summarized(Conversation),
}

/// Orchestrates conversation state, truncation and the completion exchange.
///
/// Generic over the repositories to keep chatpartner-core free of any
/// storage crate.
pub struct ChatService<C: ConversationRepository, L: SystemLogRepository> {
    conversations: C,
    system_log: L,
    provider: BoxLlmProvider,
    tokenizer: Box<dyn Tokenizer>,
    config: Arc<ChatPartnerConfig>,
    guard: TokenGuard,
}

impl<C: ConversationRepository, L: SystemLogRepository> ChatService<C, L> {
    pub fn new(
        conversations: C,
        system_log: L,
        provider: BoxLlmProvider,
        tokenizer: Box<dyn Tokenizer>,
        config: Arc<ChatPartnerConfig>,
    ) -> Self {
        let guard = TokenGuard::new(config.llm.max_context_tokens);
        Self {
            conversations,
            system_log,
            provider,
            tokenizer,
            config,
            guard,
        }
    }

    pub fn conversations(&self) -> &C {
        &self.conversations
    }

    pub fn system_log(&self) -> &L {
        &self.system_log
    }

    pub fn config(&self) -> &ChatPartnerConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Inbound user text as a message addressed to the bot.
    ///
    /// `username` must already be normalized.
    pub fn user_message(&self, chat_id: &str, username: &str, content: &str) -> Message {
        Message::new(
            content,
            username,
            &self.config.bot.name,
            MessageRole::User,
            MessageCategory::User,
            chat_id,
        )
        .with_token_count(self.tokenizer.count(content))
    }

    // --- Lifecycle audit ---

    /// Record that the bot process came up.
    pub async fn announce_start(&self) -> Result<(), ChatError> {
        let text = format!("{} {}", self.config.bot.name, self.config.notices.start);
        self.audit(SYSTEM_LOG_CHAT_ID, &text, MessageCategory::SystemLog)
            .await?;
        info!(bot = %self.config.bot.name, provider = self.provider.name(), "bot started");
        Ok(())
    }

    /// Record that the bot process is going down.
    pub async fn announce_stop(&self) -> Result<(), ChatError> {
        let text = format!("{} {}", self.config.bot.name, self.config.notices.stop);
        self.audit(SYSTEM_LOG_CHAT_ID, &text, MessageCategory::SystemLog)
            .await?;
        info!(bot = %self.config.bot.name, "bot stopped");
        Ok(())
    }

    // --- Conversation operations ---

    /// The stored conversation of a chat.
    pub async fn transcript(&self, chat_id: &str) -> Result<Conversation, ChatError> {
        Ok(self.conversations.load(chat_id).await?)
    }

    /// Forget a chat and start over with a fresh priming triplet.
    ///
    /// Returns the reset notice to show to the user.
    pub async fn reset(&self, chat_id: &str, username: &str) -> Result<String, ChatError> {
        let removed = self.conversations.delete(chat_id).await?;
        self.start_conversation(chat_id, username).await?;
        let notices = &self.config.notices;
        self.audit(
            chat_id,
            &format!("{} {}", notices.conversation_reset, username),
            MessageCategory::Log,
        )
        .await?;
        info!(chat_id, username, removed = removed.len(), "conversation reset");
        Ok(notices.console_reset.clone())
    }

    /// Run one turn: guard the budget, send the transcript, store the reply.
    ///
    /// A failed exchange rolls the user message back and yields a synthetic
    /// error message instead of a reply. `Err` is only returned when storage
    /// fails before the exchange starts.
    #[tracing::instrument(
        name = "process_message",
        skip(self, message),
        fields(chat_id = %message.chat_id, sender = %message.sender)
    )]
    pub async fn process_message(&self, mut message: Message) -> Result<Message, ChatError> {
        if message.token_count == 0 {
            message.token_count = self.tokenizer.count(&message.content);
        }
        let chat_id = message.chat_id.clone();
        let username = message.sender.clone();

        let mut conversation = self.open_conversation(&chat_id, &username).await?;

        let recent = self
            .conversations
            .last_messages(&chat_id, PREVIOUS_TURN_WINDOW)
            .await?;
        let previous_tokens = TokenGuard::previous_turn_tokens(&recent);
        if self.guard.exceeds(previous_tokens) {
            info!(
                tokens = previous_tokens,
                limit = self.guard.max_context_tokens,
                "previous turn over budget, truncating"
            );
            match self.truncate_and_summarize(&chat_id, &username).await? {
                Truncation::Restarted => return Ok(self.too_long_reply(&chat_id, &username)),
                Truncation::Summarized(rebuilt) => conversation = rebuilt,
            }
        }

        self.add_message(&mut conversation, message).await?;

        match self.exchange(&mut conversation, &username).await {
            Ok(reply) => Ok(reply),
            Err(err) => Ok(self.recover(&mut conversation, err).await),
        }
    }

    /// Remove the stored conversation and rebuild it around a summary.
    ///
    /// Only user rows count: with fewer than seven the conversation restarts
    /// from the priming triplet alone. Otherwise the user rows between the
    /// first three and the last three are condensed into one summary message.
    #[tracing::instrument(name = "truncate_and_summarize", skip(self))]
    pub async fn truncate_and_summarize(
        &self,
        chat_id: &str,
        username: &str,
    ) -> Result<Truncation, ChatError> {
        let removed: Vec<Message> = self
            .conversations
            .delete(chat_id)
            .await?
            .into_iter()
            .filter(|m| m.category == MessageCategory::User)
            .collect();
        let notices = &self.config.notices;

        let (middle, tail) = match ConversationSummarizer::plan(&removed) {
            TruncationPlan::Restart => {
                self.start_conversation(chat_id, username).await?;
                self.audit(
                    chat_id,
                    &format!("{} {}", notices.conversation_reset, username),
                    MessageCategory::Log,
                )
                .await?;
                info!(removed = removed.len(), "conversation too short to summarize, restarted");
                return Ok(Truncation::Restarted);
            }
            TruncationPlan::Summarize { middle, tail } => (middle, tail),
        };

        let mut rebuilt = Conversation::new(chat_id);
        rebuilt.set_config(priming_messages(
            &self.config.bot,
            chat_id,
            username,
            self.tokenizer.as_ref(),
        ));

        let llm = &self.config.llm;
        match ConversationSummarizer::summarize(&self.provider, middle, &llm.model, llm.summary_max_tokens)
            .await
        {
            Ok(summary) => rebuilt.push(self.summary_message(chat_id, username, &summary)),
            Err(err) => {
                warn!(error = %err, "summarization failed, keeping only the recent messages");
                self.audit(
                    chat_id,
                    &format!("{} {}", notices.error, err),
                    MessageCategory::Log,
                )
                .await?;
            }
        }

        for message in tail {
            let mut kept = message.clone();
            kept.id = None;
            rebuilt.push(kept);
        }

        self.conversations.save(&rebuilt).await?;
        self.audit(
            chat_id,
            &format!("{} {}", notices.summarized, username),
            MessageCategory::Log,
        )
        .await?;
        info!(
            removed = removed.len(),
            summarized = middle.len(),
            kept = tail.len(),
            "conversation rebuilt around summary"
        );

        Ok(Truncation::Summarized(self.conversations.load(chat_id).await?))
    }

    // --- Internals ---

    /// Load a chat's conversation, priming it first if nothing is stored.
    async fn open_conversation(&self, chat_id: &str, username: &str) -> Result<Conversation, ChatError> {
        if self.conversations.config_exists(chat_id).await? {
            return Ok(self.conversations.load(chat_id).await?);
        }

        let conversation = self.start_conversation(chat_id, username).await?;
        self.audit(
            chat_id,
            &format!("{} {}", self.config.notices.conversation_start, username),
            MessageCategory::Log,
        )
        .await?;
        info!(chat_id, username, "conversation started");
        Ok(conversation)
    }

    /// Persist the priming triplet and return the stored view.
    async fn start_conversation(&self, chat_id: &str, username: &str) -> Result<Conversation, ChatError> {
        let priming = priming_messages(&self.config.bot, chat_id, username, self.tokenizer.as_ref());
        for message in &priming {
            self.conversations.append(message).await?;
        }
        Ok(self.conversations.load(chat_id).await?)
    }

    /// Persist a user message and add it to the view.
    ///
    /// The audit entry is written first so a failing audit never leaves a
    /// stored user row without a reply.
    async fn add_message(&self, conversation: &mut Conversation, mut message: Message) -> Result<(), ChatError> {
        if self.config.runtime.log_every_message {
            self.system_log.log(&message).await?;
        }
        let id = self.conversations.append(&message).await?;
        message.id = Some(id);
        debug!(message_id = id, tokens = message.token_count, "message added");
        conversation.push(message);
        Ok(())
    }

    /// Send the conversation, backfill usage, persist the reply.
    async fn exchange(&self, conversation: &mut Conversation, username: &str) -> Result<Message, ChatError> {
        let llm = &self.config.llm;
        let request = CompletionRequest {
            model: llm.model.clone(),
            messages: conversation.to_llm_messages(),
            max_tokens: llm.max_reply_tokens,
            temperature: Some(llm.temperature),
        };
        let response = self.provider.complete(&request).await?;
        let usage = response.usage;
        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            stop_reason = %response.stop_reason,
            "completion received"
        );

        let chat_id = conversation.chat_id().to_string();
        if let Some(last) = conversation.last_user_message_mut() {
            last.token_count = usage.input_tokens;
            if let Some(id) = last.id {
                self.conversations
                    .update_token_count(id, usage.input_tokens)
                    .await?;
            }
        }

        let mut reply = Message::new(
            response.content,
            &self.config.bot.name,
            username,
            MessageRole::Assistant,
            MessageCategory::User,
            chat_id,
        )
        .with_token_count(usage.output_tokens);
        let id = self.conversations.append(&reply).await?;
        reply.id = Some(id);
        conversation.push(reply.clone());
        Ok(reply)
    }

    /// Undo the pending user message and build the error reply.
    ///
    /// Storage problems here are only logged; the caller always gets a reply.
    async fn recover(&self, conversation: &mut Conversation, err: ChatError) -> Message {
        let chat_id = conversation.chat_id().to_string();
        warn!(error = %err, "exchange failed, rolling back");

        if conversation.pop_user().is_some() {
            if let Err(remove_err) = self.conversations.remove_last(&chat_id).await {
                warn!(error = %remove_err, "failed to remove last stored message");
            }
            if let Err(log_err) = self
                .audit(&chat_id, &self.config.notices.remove_last_message, MessageCategory::Log)
                .await
            {
                warn!(error = %log_err, "failed to audit rollback");
            }
        }

        let notices = &self.config.notices;
        let content = format!(
            "{} {} {}",
            notices.framed(&notices.error),
            notices.log_prefix,
            err
        );
        let reply = Message::log_entry(content, MessageCategory::Log, chat_id);
        if let Err(log_err) = self.system_log.log(&reply).await {
            warn!(error = %log_err, "failed to audit exchange error");
        }
        reply
    }

    fn summary_message(&self, chat_id: &str, username: &str, summary: &str) -> Message {
        let content = ConversationSummarizer::summary_content(summary);
        let tokens = self.tokenizer.count(&content);
        Message::new(
            content,
            &self.config.bot.name,
            username,
            MessageRole::System,
            MessageCategory::User,
            chat_id,
        )
        .with_token_count(tokens)
    }

    fn too_long_reply(&self, chat_id: &str, username: &str) -> Message {
        Message::new(
            &self.config.notices.too_long,
            &self.config.bot.name,
            username,
            MessageRole::Assistant,
            MessageCategory::Log,
            chat_id,
        )
    }

    async fn audit(
        &self,
        chat_id: &str,
        text: &str,
        category: MessageCategory,
    ) -> Result<(), ChatError> {
        let entry = Message::log_entry(self.config.notices.framed(text), category, chat_id);
        self.system_log.log(&entry).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::priming::is_priming;
    use crate::conversation::summarizer::SUMMARY_PREFIX;
    use crate::llm::tokenizer::EstimatingTokenizer;
    use crate::testing::{InMemoryConversations, InMemorySystemLog, ScriptedProvider};
    use chatpartner_types::llm::LlmError;

    const CHAT: &str = "4711";
    const USER: &str = "Ada";

    type TestService = ChatService<InMemoryConversations, InMemorySystemLog>;

    struct Harness {
        service: TestService,
        conversations: InMemoryConversations,
        system_log: InMemorySystemLog,
        provider: ScriptedProvider,
    }

    fn harness_with(config: ChatPartnerConfig) -> Harness {
        let conversations = InMemoryConversations::default();
        let system_log = InMemorySystemLog::default();
        let provider = ScriptedProvider::default();
        let service = ChatService::new(
            conversations.clone(),
            system_log.clone(),
            BoxLlmProvider::new(provider.clone()),
            Box::new(EstimatingTokenizer),
            Arc::new(config),
        );
        Harness {
            service,
            conversations,
            system_log,
            provider,
        }
    }

    fn harness() -> Harness {
        let mut config = ChatPartnerConfig::default();
        config.llm.max_context_tokens = 50;
        harness_with(config)
    }

    impl Harness {
        async fn send(&self, text: &str) -> Message {
            let message = self.service.user_message(CHAT, USER, text);
            self.service.process_message(message).await.unwrap()
        }

        fn contents(&self) -> Vec<String> {
            self.conversations
                .rows(CHAT)
                .into_iter()
                .map(|m| m.content)
                .collect()
        }
    }

    #[tokio::test]
    async fn test_first_message_persists_priming_before_user_message() {
        let h = harness();
        h.provider.reply("Hi Ada!", 30, 4);

        let reply = h.send("Hello there").await;

        assert_eq!(reply.content, "Hi Ada!");
        assert_eq!(reply.role, MessageRole::Assistant);
        let rows = h.conversations.rows(CHAT);
        assert_eq!(rows.len(), 5);
        assert!(is_priming(&rows[..3]));
        assert_eq!(rows[3].content, "Hello there");
        assert_eq!(rows[4].content, "Hi Ada!");
    }

    #[tokio::test]
    async fn test_priming_stays_the_only_config_prefix_across_turns() {
        let h = harness();
        h.provider.reply("r1", 10, 2).reply("r2", 12, 2).reply("r3", 14, 2);

        for text in ["one", "two", "three"] {
            h.send(text).await;
        }

        let rows = h.conversations.rows(CHAT);
        let config_rows = rows
            .iter()
            .take_while(|m| m.category == MessageCategory::Config)
            .count();
        assert_eq!(config_rows, 3);
        assert!(is_priming(&rows[..3]));
        assert!(rows[3..].iter().all(|m| m.category == MessageCategory::User));
    }

    #[tokio::test]
    async fn test_exchange_backfills_usage_counters() {
        let h = harness();
        h.provider.reply("Hi!", 37, 3);

        h.send("Hello there").await;

        let rows = h.conversations.rows(CHAT);
        assert_eq!(rows[3].token_count, 37);
        assert_eq!(rows[4].token_count, 3);
    }

    #[tokio::test]
    async fn test_exchange_sends_full_transcript_with_reply_budget() {
        let h = harness();
        h.provider.reply("Hi!", 10, 3);

        h.send("Hello there").await;

        let requests = h.provider.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.max_tokens, h.service.config().llm.max_reply_tokens);
        let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(request.messages[3].name.as_deref(), Some(USER));
    }

    #[tokio::test]
    async fn test_failed_exchange_leaves_transcript_length_unchanged() {
        let h = harness();
        h.provider
            .reply("r1", 10, 2)
            .fail(LlmError::Connection("connection reset".to_string()));

        h.send("one").await;
        let before = h.conversations.rows(CHAT).len();

        let reply = h.send("two").await;

        assert_eq!(h.conversations.rows(CHAT).len(), before);
        assert_eq!(reply.category, MessageCategory::Log);
        assert!(reply.content.contains(&h.service.config().notices.error));
        assert!(reply.content.contains("connection reset"));
        let audit = h.system_log.contents();
        assert!(
            audit
                .iter()
                .any(|c| c.contains(&h.service.config().notices.remove_last_message))
        );
    }

    #[tokio::test]
    async fn test_failed_first_exchange_keeps_only_priming() {
        let h = harness();
        h.provider.fail(LlmError::AuthenticationFailed);

        let reply = h.send("hello").await;

        let rows = h.conversations.rows(CHAT);
        assert!(is_priming(&rows));
        assert!(reply.content.contains("authentication failed"));
    }

    #[tokio::test]
    async fn test_overflow_with_seven_or_more_rebuilds_around_summary() {
        let h = harness();
        h.provider
            .reply("r1", 10, 5)
            .reply("r2", 12, 6)
            .reply("r3", 14, 6)
            .reply("r4", 40, 30)
            .reply("they chatted", 20, 3)
            .reply("r5", 20, 4);

        for text in ["one", "two", "three", "four"] {
            h.send(text).await;
        }
        assert_eq!(h.conversations.rows(CHAT).len(), 11);

        let reply = h.send("five").await;
        assert_eq!(reply.content, "r5");

        let rows = h.conversations.rows(CHAT);
        assert!(is_priming(&rows[..3]));
        assert_eq!(rows[3].content, format!("{SUMMARY_PREFIX} they chatted"));
        assert_eq!(rows[3].role, MessageRole::System);
        assert_eq!(
            h.contents()[4..],
            ["r3", "four", "r4", "five", "r5"].map(String::from)
        );

        let requests = h.provider.requests();
        let summary_prompt = &requests[4].messages[0].content;
        assert!(summary_prompt.ends_with("r2\nthree"));
        assert!(!summary_prompt.contains("one"));
        assert!(!summary_prompt.contains("four"));
        assert_eq!(requests[5].messages.len(), 8);
    }

    #[tokio::test]
    async fn test_truncate_and_summarize_yields_priming_summary_and_tail() {
        let h = harness();
        h.provider
            .reply("r1", 5, 5)
            .reply("r2", 5, 5)
            .reply("r3", 5, 5)
            .reply("r4", 5, 5)
            .reply("sum", 5, 5);
        for text in ["one", "two", "three", "four"] {
            h.send(text).await;
        }

        let truncation = h.service.truncate_and_summarize(CHAT, USER).await.unwrap();

        let Truncation::Summarized(rebuilt) = truncation else {
            panic!("expected a rebuilt conversation");
        };
        assert_eq!(rebuilt.len(), 7);
        assert!(is_priming(rebuilt.config_messages()));
        let history: Vec<&str> = rebuilt
            .user_messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            history,
            vec!["Summary of the conversation so far: sum", "r3", "four", "r4"]
        );
        let audit = h.system_log.contents();
        assert!(
            audit
                .iter()
                .any(|c| c.contains(&h.service.config().notices.summarized))
        );
    }

    #[tokio::test]
    async fn test_truncate_counts_only_user_rows() {
        let h = harness();
        h.provider.reply("r1", 5, 5).reply("r2", 5, 5);
        h.send("one").await;
        h.send("two").await;
        assert_eq!(h.conversations.rows(CHAT).len(), 7);

        let truncation = h.service.truncate_and_summarize(CHAT, USER).await.unwrap();

        assert!(matches!(truncation, Truncation::Restarted));
        assert!(is_priming(&h.conversations.rows(CHAT)));
        assert_eq!(h.provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_overflow_below_seven_resets_and_returns_too_long_notice() {
        let h = harness();
        h.provider.reply("r1", 40, 30);
        h.send("one").await;

        let reply = h.send("two").await;

        assert_eq!(reply.content, h.service.config().notices.too_long);
        assert!(is_priming(&h.conversations.rows(CHAT)));
        assert_eq!(h.provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_overflow_with_four_user_rows_still_resets() {
        let h = harness();
        h.provider.reply("r1", 10, 5).reply("r2", 40, 30);
        h.send("one").await;
        h.send("two").await;

        let reply = h.send("three").await;

        assert_eq!(reply.content, h.service.config().notices.too_long);
        assert_eq!(reply.category, MessageCategory::Log);
        assert!(is_priming(&h.conversations.rows(CHAT)));
        assert_eq!(h.provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_summary_keeps_recent_messages_only() {
        let h = harness();
        h.provider
            .reply("r1", 10, 5)
            .reply("r2", 12, 6)
            .reply("r3", 14, 6)
            .reply("r4", 40, 30)
            .fail(LlmError::Overloaded("busy".to_string()))
            .reply("r5", 20, 4);
        for text in ["one", "two", "three", "four"] {
            h.send(text).await;
        }

        h.send("five").await;

        assert_eq!(
            h.contents()[3..],
            ["r3", "four", "r4", "five", "r5"].map(String::from)
        );
    }

    #[tokio::test]
    async fn test_reset_leaves_only_fresh_priming() {
        let h = harness();
        h.provider.reply("r1", 10, 2);
        h.send("one").await;

        let notice = h.service.reset(CHAT, USER).await.unwrap();

        assert_eq!(notice, h.service.config().notices.console_reset);
        let transcript = h.service.transcript(CHAT).await.unwrap();
        assert_eq!(transcript.len(), 3);
        assert!(is_priming(transcript.config_messages()));
        assert_eq!(transcript.user_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_does_not_touch_other_chats() {
        let h = harness();
        h.provider.reply("r1", 10, 2).reply("other", 10, 2);
        h.send("one").await;
        let other = h.service.user_message("other-chat", "Bob", "hey");
        h.service.process_message(other).await.unwrap();

        h.service.reset(CHAT, USER).await.unwrap();

        assert_eq!(h.conversations.rows("other-chat").len(), 5);
    }

    #[tokio::test]
    async fn test_lifecycle_events_go_to_system_log_chat() {
        let h = harness();

        h.service.announce_start().await.unwrap();
        h.service.announce_stop().await.unwrap();

        let entries = h.system_log.all();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.chat_id == SYSTEM_LOG_CHAT_ID));
        assert!(entries.iter().all(|e| e.category == MessageCategory::SystemLog));
        assert_eq!(entries[0].content, "*** ChatPartner started ***");
        assert_eq!(entries[1].content, "*** ChatPartner stopped ***");
    }

    #[tokio::test]
    async fn test_every_message_is_audited_when_enabled() {
        let h = harness();
        h.provider.reply("r1", 10, 2);

        h.send("audit me").await;

        let audit = h.system_log.contents();
        assert!(audit.iter().any(|c| c.contains("Conversation started with Ada")));
        assert!(audit.iter().any(|c| c == "audit me"));
    }

    #[tokio::test]
    async fn test_message_audit_can_be_disabled() {
        let mut config = ChatPartnerConfig::default();
        config.runtime.log_every_message = false;
        let h = harness_with(config);
        h.provider.reply("r1", 10, 2);

        h.send("keep me private").await;

        assert!(!h.system_log.contents().iter().any(|c| c == "keep me private"));
    }

    #[tokio::test]
    async fn test_storage_failure_before_exchange_is_an_error() {
        let h = harness();
        h.provider.reply("r1", 10, 2);
        h.send("one").await;
        h.conversations.fail_appends(true);

        let message = h.service.user_message(CHAT, USER, "two");
        let result = h.service.process_message(message).await;

        assert!(matches!(result, Err(ChatError::Repository(_))));
        assert_eq!(h.provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_message_audit_stores_no_user_row() {
        let h = harness();
        h.provider.reply("r1", 10, 2).reply("r2", 10, 2);
        h.send("one").await;
        let before = h.conversations.rows(CHAT).len();
        h.system_log.fail_logs(true);

        let message = h.service.user_message(CHAT, USER, "two");
        let result = h.service.process_message(message).await;

        assert!(matches!(result, Err(ChatError::Repository(_))));
        let rows = h.conversations.rows(CHAT);
        assert_eq!(rows.len(), before);
        assert_eq!(rows.last().map(|m| m.content.as_str()), Some("r1"));
        assert_eq!(h.provider.requests().len(), 1);

        h.system_log.fail_logs(false);
        h.send("three").await;
        let history = h.service.transcript(CHAT).await.unwrap();
        let roles: Vec<MessageRole> = history.user_messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
    }
}
