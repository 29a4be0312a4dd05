//! OpenAI-compatible completion provider.
//!
//! A single [`OpenAiCompatibleProvider`] serves OpenAI and any server that
//! speaks the same chat-completions API (selected via `llm.base_url`).
//!
//! Uses [`async_openai`] for type-safe request/response handling.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, FinishReason,
};
use secrecy::{ExposeSecret, SecretString};

use chatpartner_core::llm::provider::LlmProvider;
use chatpartner_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, LlmMessage, MessageRole, StopReason, Usage,
};

/// Base URL of the public OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for an [`OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
}

impl OpenAiCompatConfig {
    /// OpenAI itself, or a compatible server when `base_url` is given.
    pub fn new(api_key: SecretString, model: &str, base_url: Option<&str>) -> Self {
        let (provider_name, base_url) = match base_url {
            Some(url) => ("openai-compatible", url),
            None => ("openai", OPENAI_BASE_URL),
        };
        Self {
            provider_name: provider_name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

/// Completion provider for any OpenAI-compatible API.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            model: config.model,
        }
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let messages = request.messages.iter().map(to_openai_message).collect();

        // Use the model from the request if set, otherwise fall back to config default
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

fn to_openai_message(msg: &LlmMessage) -> ChatCompletionRequestMessage {
    let name = msg.name.clone();
    match msg.role {
        MessageRole::System => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                name,
            })
        }
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
            name,
        }),
        MessageRole::Assistant => {
            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                    msg.content.clone(),
                )),
                refusal: None,
                name,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = self.build_request(request);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        let choice = response.choices.first();
        let content = choice
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(|fr| match fr {
                FinishReason::Length => StopReason::MaxTokens,
                FinishReason::ContentFilter => StopReason::ContentFilter,
                FinishReason::Stop | FinishReason::ToolCalls | FinishReason::FunctionCall => {
                    StopReason::EndTurn
                }
            })
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            provider = %self.provider_name,
            model = %response.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "chat completion finished"
        );

        Ok(CompletionResponse {
            id: response.id,
            content,
            model: response.model,
            stop_reason,
            usage,
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
///
/// Transport failures without an HTTP status become `Connection` so the
/// process-level retry loop can pick them up.
pub(crate) fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "context_length_exceeded"
                || api_err.message.contains("maximum context length")
            {
                LlmError::ContextLengthExceeded
            } else if code == "server_error" || error_type == "server_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status() {
            Some(status) => match status.as_u16() {
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                502..=504 | 529 => LlmError::Overloaded(err.to_string()),
                _ => LlmError::Provider {
                    message: err.to_string(),
                },
            },
            None => LlmError::Connection(err.to_string()),
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: Option<&str>) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(OpenAiCompatConfig::new(
            SecretString::from("sk-test".to_string()),
            "gpt-4o-mini",
            base_url,
        ))
    }

    fn request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![
                LlmMessage {
                    role: MessageRole::System,
                    content: "You are Luna.".to_string(),
                    name: Some("Luna".to_string()),
                },
                LlmMessage {
                    role: MessageRole::User,
                    content: "hi".to_string(),
                    name: Some("Ada".to_string()),
                },
                LlmMessage {
                    role: MessageRole::Assistant,
                    content: "hello".to_string(),
                    name: None,
                },
            ],
            max_tokens: 256,
            temperature: Some(0.5),
        }
    }

    #[test]
    fn test_config_defaults_to_openai() {
        let config = OpenAiCompatConfig::new(SecretString::from("k".to_string()), "gpt-4o", None);
        assert_eq!(config.provider_name, "openai");
        assert_eq!(config.base_url, OPENAI_BASE_URL);
    }

    #[test]
    fn test_config_custom_base_url_is_trimmed() {
        let config =
            OpenAiCompatConfig::new(SecretString::from("k".to_string()), "llama", Some("http://localhost:8080/v1/"));
        assert_eq!(config.provider_name, "openai-compatible");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_build_request_maps_roles_names_and_budget() {
        let built = provider(None).build_request(&request("gpt-4o"));

        assert_eq!(built.model, "gpt-4o");
        assert_eq!(built.max_completion_tokens, Some(256));
        assert_eq!(built.temperature, Some(0.5));
        assert_eq!(built.messages.len(), 3);
        match &built.messages[1] {
            ChatCompletionRequestMessage::User(user) => {
                assert_eq!(user.name.as_deref(), Some("Ada"));
            }
            other => panic!("expected a user message, got {other:?}"),
        }
        assert!(matches!(
            built.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    #[test]
    fn test_build_request_falls_back_to_configured_model() {
        let built = provider(None).build_request(&request(""));
        assert_eq!(built.model, "gpt-4o-mini");
    }

    #[test]
    fn test_map_invalid_argument() {
        let err = map_openai_error(async_openai::error::OpenAIError::InvalidArgument(
            "bad temperature".to_string(),
        ));
        assert!(matches!(err, LlmError::InvalidRequest(ref m) if m == "bad temperature"));
        assert!(!err.is_connectivity());
    }
}
