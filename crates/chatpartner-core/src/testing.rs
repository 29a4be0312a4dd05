//! In-memory fakes shared by the service tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chatpartner_types::error::{ImageError, RepositoryError};
use chatpartner_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
use chatpartner_types::message::{Message, MessageCategory};

use crate::conversation::Conversation;
use crate::conversation::repository::{ConversationRepository, SystemLogRepository};
use crate::llm::provider::LlmProvider;
use crate::picture::ImageGenerator;

#[derive(Default)]
struct Rows {
    next_id: i64,
    messages: Vec<Message>,
}

/// `Vec`-backed transcript store. Clones share the same rows.
#[derive(Clone, Default)]
pub struct InMemoryConversations {
    rows: Arc<Mutex<Rows>>,
    fail_appends: Arc<AtomicBool>,
}

impl InMemoryConversations {
    /// Every stored row of a chat, in id order.
    pub fn rows(&self, chat_id: &str) -> Vec<Message> {
        let rows = self.rows.lock().unwrap();
        rows.messages.iter().filter(|m| m.chat_id == chat_id).cloned().collect()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    fn insert(rows: &mut Rows, message: &Message) -> i64 {
        rows.next_id += 1;
        let mut stored = message.clone();
        stored.id = Some(rows.next_id);
        rows.messages.push(stored);
        rows.next_id
    }
}

impl ConversationRepository for InMemoryConversations {
    async fn load(&self, chat_id: &str) -> Result<Conversation, RepositoryError> {
        Ok(Conversation::from_messages(chat_id, self.rows(chat_id)))
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        rows.messages.retain(|m| m.chat_id != conversation.chat_id());
        for message in conversation.full_messages() {
            Self::insert(&mut rows, message);
        }
        Ok(())
    }

    async fn append(&self, message: &Message) -> Result<i64, RepositoryError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk full".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        Ok(Self::insert(&mut rows, message))
    }

    async fn remove_last(&self, chat_id: &str) -> Result<Option<Message>, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let position = rows.messages.iter().rposition(|m| m.chat_id == chat_id);
        Ok(position.map(|i| rows.messages.remove(i)))
    }

    async fn delete(&self, chat_id: &str) -> Result<Vec<Message>, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let (removed, kept): (Vec<Message>, Vec<Message>) = std::mem::take(&mut rows.messages)
            .into_iter()
            .partition(|m| m.chat_id == chat_id);
        rows.messages = kept;
        Ok(removed)
    }

    async fn last_messages(&self, chat_id: &str, limit: u32) -> Result<Vec<Message>, RepositoryError> {
        let mut recent = self.rows(chat_id);
        recent.reverse();
        recent.truncate(limit as usize);
        Ok(recent)
    }

    async fn update_token_count(&self, message_id: i64, token_count: u32) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let message = rows
            .messages
            .iter_mut()
            .find(|m| m.id == Some(message_id))
            .ok_or(RepositoryError::NotFound)?;
        message.token_count = token_count;
        Ok(())
    }

    async fn config_exists(&self, chat_id: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .rows(chat_id)
            .iter()
            .any(|m| m.category == MessageCategory::Config))
    }
}

/// `Vec`-backed audit trail. Clones share the same entries.
#[derive(Clone, Default)]
pub struct InMemorySystemLog {
    entries: Arc<Mutex<Vec<Message>>>,
    fail_logs: Arc<AtomicBool>,
}

impl InMemorySystemLog {
    pub fn fail_logs(&self, fail: bool) {
        self.fail_logs.store(fail, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Message> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contents(&self) -> Vec<String> {
        self.all().into_iter().map(|m| m.content).collect()
    }
}

impl SystemLogRepository for InMemorySystemLog {
    async fn log(&self, entry: &Message) -> Result<(), RepositoryError> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn entries(&self, chat_id: Option<&str>, limit: u32) -> Result<Vec<Message>, RepositoryError> {
        let mut entries: Vec<Message> = self
            .all()
            .into_iter()
            .filter(|m| chat_id.is_none_or(|id| m.chat_id == id))
            .collect();
        entries.reverse();
        entries.truncate(limit as usize);
        Ok(entries)
    }
}

/// Provider that replays queued outcomes and records every request.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    outcomes: Arc<Mutex<VecDeque<Result<CompletionResponse, LlmError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn reply(&self, content: &str, input_tokens: u32, output_tokens: u32) -> &Self {
        self.outcomes.lock().unwrap().push_back(Ok(CompletionResponse {
            id: "resp-scripted".to_string(),
            content: content.to_string(),
            model: "test-model".to_string(),
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens,
                output_tokens,
            },
        }));
        self
    }

    pub fn fail(&self, error: LlmError) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Connection("script exhausted".to_string())))
    }
}

/// Image generator returning fixed bytes, or failing.
#[derive(Clone, Default)]
pub struct FakeImageGenerator {
    fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeImageGenerator {
    pub const BYTES: &'static [u8] = b"\x89PNG fake";

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ImageGenerator for FakeImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(ImageError::Provider("content policy".to_string()));
        }
        Ok(Self::BYTES.to_vec())
    }
}
