//! LlmProvider trait definition.
//!
//! This is the core abstraction that completion backends implement.
//! Uses RPITIT for `complete`; see [`super::box_provider`] for the
//! object-safe wrapper.

use chatpartner_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for text-completion backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in chatpartner-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    ///
    /// The response must carry usage counters; the conversation pipeline
    /// backfills token counts from them.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
