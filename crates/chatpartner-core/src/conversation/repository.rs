//! Conversation and audit-trail repository trait definitions.
//!
//! The infrastructure layer (chatpartner-infra) implements these with SQLite
//! persistence. Consistency contract: last writer wins. Nothing isolates two
//! concurrent turns on the same chat id; each turn re-reads what is stored.
//!
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).

use chatpartner_types::error::RepositoryError;
use chatpartner_types::message::Message;

use super::Conversation;

/// Repository trait for per-chat transcripts.
pub trait ConversationRepository: Send + Sync {
    /// Rebuild the conversation view of a chat (empty if none is stored).
    fn load(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Replace every stored row of the conversation's chat with its messages.
    fn save(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert one message and return its assigned id.
    fn append(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    /// Delete the most recently inserted row of a chat and return it.
    fn remove_last(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Delete every row of a chat and return them in id order.
    fn delete(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Most recent `limit` rows of a chat, id descending.
    fn last_messages(
        &self,
        chat_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Backfill the token count of a stored message.
    fn update_token_count(
        &self,
        message_id: i64,
        token_count: u32,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Whether the priming messages of a chat are stored.
    fn config_exists(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Repository trait for the append-only audit trail.
///
/// Conversation logic only writes here. Reading back is for inspection tools.
pub trait SystemLogRepository: Send + Sync {
    fn log(
        &self,
        entry: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recent entries, id descending, optionally for a single chat.
    fn entries(
        &self,
        chat_id: Option<&str>,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
