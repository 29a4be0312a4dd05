//! Completion provider implementations.

pub mod openai_compat;

use chatpartner_core::llm::box_provider::BoxLlmProvider;
use chatpartner_types::config::LlmSettings;
use secrecy::SecretString;

use self::openai_compat::{OpenAiCompatConfig, OpenAiCompatibleProvider};

/// Build the configured completion provider behind dynamic dispatch.
pub fn create_provider(settings: &LlmSettings, api_key: SecretString) -> BoxLlmProvider {
    let config = OpenAiCompatConfig::new(api_key, &settings.model, settings.base_url.as_deref());
    tracing::debug!(
        provider = %config.provider_name,
        base_url = %config.base_url,
        model = %config.model,
        "creating completion provider"
    );
    BoxLlmProvider::new(OpenAiCompatibleProvider::new(config))
}
