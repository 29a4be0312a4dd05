//! Application state wiring all services together.
//!
//! AppState owns the configuration and the storage adapters. The services that
//! need an API key are built on demand, so the inspection commands work
//! without one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatpartner_core::chat::service::ChatService;
use chatpartner_core::picture::PictureService;
use chatpartner_infra::config::{OPENAI_API_KEY_ENV, load_config, require_secret, resolve_data_dir};
use chatpartner_infra::image::OpenAiImageGenerator;
use chatpartner_infra::llm::create_provider;
use chatpartner_infra::sqlite::conversation::SqliteConversationRepository;
use chatpartner_infra::sqlite::pool::{DatabasePool, database_url_for};
use chatpartner_infra::sqlite::system_log::SqliteSystemLog;
use chatpartner_infra::tokenizer::tokenizer_for_model;
use chatpartner_types::config::ChatPartnerConfig;
use tracing::info;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteConversationRepository, SqliteSystemLog>;

pub type ConcretePictureService = PictureService<OpenAiImageGenerator>;

/// Shared application state for every front-end and command.
pub struct AppState {
    pub config: Arc<ChatPartnerConfig>,
    pub conversations: SqliteConversationRepository,
    pub system_log: SqliteSystemLog,
    pub data_dir: PathBuf,
    pub pool: DatabasePool,
}

impl AppState {
    /// Resolve the data directory, load the configuration and open the database.
    pub async fn init(data_dir: Option<&Path>, database_url: Option<&str>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir(data_dir);

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = Arc::new(load_config(&data_dir).await?);

        let db_url = database_url
            .map(str::to_string)
            .unwrap_or_else(|| database_url_for(&data_dir));
        let pool = DatabasePool::connect(&db_url).await?;

        info!(
            data_dir = %data_dir.display(),
            bot = %config.bot.name,
            model = %config.llm.model,
            "application state ready"
        );

        Ok(Self {
            config,
            conversations: SqliteConversationRepository::new(pool.clone()),
            system_log: SqliteSystemLog::new(pool.clone()),
            data_dir,
            pool,
        })
    }

    /// Chat service backed by the configured completion provider.
    ///
    /// Fails when `OPENAI_API_KEY` is not set.
    pub fn chat_service(&self) -> anyhow::Result<ConcreteChatService> {
        let api_key = require_secret(OPENAI_API_KEY_ENV)?;
        let provider = create_provider(&self.config.llm, api_key);
        let tokenizer = tokenizer_for_model(&self.config.llm.model);

        Ok(ChatService::new(
            self.conversations.clone(),
            self.system_log.clone(),
            provider,
            tokenizer,
            Arc::clone(&self.config),
        ))
    }

    /// Picture service writing into `runtime.image_output_dir`.
    ///
    /// Fails when `OPENAI_API_KEY` is not set.
    pub fn picture_service(&self) -> anyhow::Result<ConcretePictureService> {
        let api_key = require_secret(OPENAI_API_KEY_ENV)?;
        let generator = OpenAiImageGenerator::new(
            api_key,
            self.config.image.clone(),
            self.config.llm.base_url.as_deref(),
        );
        Ok(PictureService::new(
            generator,
            &self.config.runtime.image_output_dir,
        ))
    }
}
