//! Message records for conversations and the system log.
//!
//! A `Message` is the single record shape shared by the transcript table and
//! the audit trail. It is immutable once stored, except for the token count
//! which is backfilled after a completion response arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

// Re-export MessageRole from llm module (it's used in both transcript and llm contexts).
pub use crate::llm::MessageRole;
use crate::llm::LlmMessage;

/// Chat id under which bot lifecycle events are logged.
pub const SYSTEM_LOG_CHAT_ID: &str = "system_log";

/// Chat id of the local console conversation.
pub const CONSOLE_CHAT_ID: &str = "system_console";

/// Name used as sender/receiver for synthetic system records.
pub const SYSTEM_PARTICIPANT: &str = "system";

/// Which bucket of a transcript (or of the audit trail) a message belongs to.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (category IN ('config', 'user', 'log', 'system_log'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    /// Priming triplet at the head of every conversation.
    Config,
    /// User turns, assistant replies, and summaries.
    User,
    /// Lifecycle events tied to one chat.
    Log,
    /// Lifecycle events of the bot process itself.
    SystemLog,
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageCategory::Config => write!(f, "config"),
            MessageCategory::User => write!(f, "user"),
            MessageCategory::Log => write!(f, "log"),
            MessageCategory::SystemLog => write!(f, "system_log"),
        }
    }
}

impl FromStr for MessageCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "config" => Ok(MessageCategory::Config),
            "user" => Ok(MessageCategory::User),
            "log" => Ok(MessageCategory::Log),
            "system_log" => Ok(MessageCategory::SystemLog),
            other => Err(format!("invalid message category: '{other}'")),
        }
    }
}

/// A single message in a transcript or in the system log.
///
/// `id` is assigned by storage on insert and is `None` for records that
/// have not been persisted yet. Ordering within a chat follows `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<i64>,
    pub chat_id: String,
    pub content: String,
    pub sender: String,
    pub receiver: String,
    pub role: MessageRole,
    pub category: MessageCategory,
    pub token_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create an unsaved message with a zero token count.
    pub fn new(
        content: impl Into<String>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        role: MessageRole,
        category: MessageCategory,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            chat_id: chat_id.into(),
            content: content.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            role,
            category,
            token_count: 0,
            created_at: Utc::now(),
        }
    }

    /// A system-authored audit record for the given chat.
    pub fn log_entry(content: impl Into<String>, category: MessageCategory, chat_id: impl Into<String>) -> Self {
        Self::new(
            content,
            SYSTEM_PARTICIPANT,
            SYSTEM_PARTICIPANT,
            MessageRole::System,
            category,
            chat_id,
        )
    }

    pub fn with_token_count(mut self, token_count: u32) -> Self {
        self.token_count = token_count;
        self
    }

    /// Wire shape sent to the completion backend.
    pub fn to_llm_message(&self) -> LlmMessage {
        LlmMessage {
            role: self.role,
            content: self.content.clone(),
            name: (!self.sender.is_empty()).then(|| self.sender.clone()),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
