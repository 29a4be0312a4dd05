//! Configuration types for ChatPartner.
//!
//! `ChatPartnerConfig` represents the `config.toml` in the data directory.
//! Every field has a default so an empty or missing file yields a working
//! console bot. Secrets are not part of this file; they come from the
//! environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatPartnerConfig {
    #[serde(default)]
    pub bot: BotSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub notices: Notices,
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
    #[serde(default)]
    pub image: ImageSettings,
}

/// Bot identity and the texts of the priming triplet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    pub name: String,
    /// Display name of the console user (normalized before use).
    pub local_username: String,
    /// System prompt; `{name}` is replaced with the bot name.
    pub system_prompt: String,
    /// Prefix of the user self-introduction.
    pub my_name_is: String,
    /// Prefix of the assistant acknowledgement.
    pub i_will_call_you: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            name: "ChatPartner".to_string(),
            local_username: "Console User".to_string(),
            system_prompt: "You are {name}, a friendly and helpful assistant. Answer concisely."
                .to_string(),
            my_name_is: "Hello, my name is".to_string(),
            i_will_call_you: "Nice to meet you! I will call you".to_string(),
        }
    }
}

impl BotSettings {
    /// System prompt with the bot name filled in.
    pub fn rendered_system_prompt(&self) -> String {
        self.system_prompt.replace("{name}", &self.name)
    }
}

/// Completion backend and token budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f64,
    /// Ceiling for the previous turn's token count before summarizing.
    pub max_context_tokens: u32,
    /// Max tokens requested for a regular reply.
    pub max_reply_tokens: u32,
    /// Max tokens requested for a summary.
    pub summary_max_tokens: u32,
    /// Override for OpenAI-compatible endpoints.
    pub base_url: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_context_tokens: 3_000,
            max_reply_tokens: 1_000,
            summary_max_tokens: 500,
            base_url: None,
        }
    }
}

/// User-facing texts and audit-log texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Notices {
    pub console_reset: String,
    pub bye: String,
    pub too_long: String,
    pub connection_error: String,
    pub log_prefix: String,
    pub log_appendix: String,
    pub start: String,
    pub stop: String,
    pub error: String,
    pub conversation_start: String,
    pub conversation_reset: String,
    pub remove_last_message: String,
    pub summarized: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            console_reset: "Conversation reset. Let's start over.".to_string(),
            bye: "Bye!".to_string(),
            too_long: "Sorry, this conversation got too long and was reset. Please send your message again."
                .to_string(),
            connection_error: "Could not connect to the remote service".to_string(),
            log_prefix: "***".to_string(),
            log_appendix: " ***".to_string(),
            start: "started".to_string(),
            stop: "stopped".to_string(),
            error: "An error occurred while talking to the model.".to_string(),
            conversation_start: "Conversation started with".to_string(),
            conversation_reset: "Conversation reset by".to_string(),
            remove_last_message: "Removed last message after failed exchange".to_string(),
            summarized: "Conversation summarized for".to_string(),
        }
    }
}

impl Notices {
    /// Wrap a log text in the configured prefix/appendix markers.
    pub fn framed(&self, text: &str) -> String {
        format!("{} {}{}", self.log_prefix, text, self.log_appendix)
    }
}

/// Messaging platform texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Greeting; supports `{user}`, `{name}`, `{model}` placeholders.
    pub start_message: String,
    pub help_message: String,
    pub image_caption: String,
    /// Reply to `/pic` without a prompt.
    pub picture_usage: String,
    /// Reply when image generation fails; the cause is appended.
    pub picture_failed: String,
    /// Printed when polling starts; supports `{name}`.
    pub started_message: String,
    /// Printed when polling stops; supports `{name}`.
    pub stopped_message: String,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            start_message: "Hi {user}! I am {name}, running on {model}. Just send me a message."
                .to_string(),
            help_message: "/start - greeting\n/reset - forget our conversation\n/pic <prompt> - generate an image\n/help - this help"
                .to_string(),
            image_caption: "Here is your picture.".to_string(),
            picture_usage: "Usage: /pic <what to draw>".to_string(),
            picture_failed: "Sorry, I could not create that picture:".to_string(),
            started_message: "{name} is listening on Telegram.".to_string(),
            stopped_message: "{name} stopped listening on Telegram.".to_string(),
        }
    }
}

impl TelegramSettings {
    pub fn render_start(&self, user: &str, name: &str, model: &str) -> String {
        self.start_message
            .replace("{user}", user)
            .replace("{name}", name)
            .replace("{model}", model)
    }

    pub fn render_started(&self, name: &str) -> String {
        self.started_message.replace("{name}", name)
    }

    pub fn render_stopped(&self, name: &str) -> String {
        self.stopped_message.replace("{name}", name)
    }
}

/// Process-level behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Extra attempts after a connectivity failure.
    pub connection_max_tries: u32,
    /// Mirror every user message into the system log.
    pub log_every_message: bool,
    /// Where generated pictures are written. Relative to the working directory.
    pub image_output_dir: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            connection_max_tries: 3,
            log_every_message: true,
            image_output_dir: ".".to_string(),
        }
    }
}

/// Image-generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub model: String,
    pub size: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            model: "dall-e-2".to_string(),
            size: "1024x1024".to_string(),
        }
    }
}
