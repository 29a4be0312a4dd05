//! Configuration loader for ChatPartner.
//!
//! Reads `config.toml` from the data directory (`~/.chatpartner/` by
//! default) into [`ChatPartnerConfig`]. Secrets never live in that file;
//! they come from the environment, optionally seeded from a `.env` file.

use std::path::{Path, PathBuf};

use chatpartner_types::config::ChatPartnerConfig;
use chatpartner_types::error::ConfigError;
use secrecy::SecretString;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CHATPARTNER_DATA_DIR";

/// File name of the configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// API key for the completion and image backends.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Bot token for the Telegram front-end.
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Resolve the data directory.
///
/// Priority:
/// 1. Explicit path (the `--data-dir` flag)
/// 2. `CHATPARTNER_DATA_DIR` environment variable
/// 3. `~/.chatpartner`
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".chatpartner");
    }

    // Last resort: current directory
    PathBuf::from(".chatpartner")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ChatPartnerConfig::default()`].
/// - If the file cannot be read or parsed, returns a [`ConfigError`].
pub async fn load_config(data_dir: &Path) -> Result<ChatPartnerConfig, ConfigError> {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return Ok(ChatPartnerConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: config_path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<ChatPartnerConfig>(&content).map_err(|err| ConfigError::Parse {
        path: config_path.display().to_string(),
        message: err.to_string(),
    })
}

/// Load a `.env` file from the working directory, if any.
///
/// Variables already set in the environment win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("Failed to load .env: {err}"),
    }
}

/// Read a required secret from the environment.
pub fn require_secret(name: &str) -> Result<SecretString, ConfigError> {
    secret_from(name, std::env::var(name).ok())
}

fn secret_from(name: &str, value: Option<String>) -> Result<SecretString, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
        _ => Err(ConfigError::MissingSecret(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await.unwrap();
        assert_eq!(config.bot.name, "ChatPartner");
        assert_eq!(config.llm.max_context_tokens, 3_000);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
[bot]
name = "Luna"
local_username = "Jürgen Müller"

[llm]
model = "gpt-4o"
max_context_tokens = 6000

[runtime]
connection_max_tries = 5
log_every_message = false
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await.unwrap();
        assert_eq!(config.bot.name, "Luna");
        assert_eq!(config.bot.local_username, "Jürgen Müller");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_context_tokens, 6_000);
        assert_eq!(config.runtime.connection_max_tries, 5);
        assert!(!config.runtime.log_every_message);
        assert_eq!(config.notices.log_prefix, "***");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "this is not { valid toml !!!")
            .await
            .unwrap();

        let result = load_config(tmp.path()).await;

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn resolve_data_dir_prefers_explicit_path() {
        let dir = resolve_data_dir(Some(Path::new("/srv/chatpartner")));
        assert_eq!(dir, PathBuf::from("/srv/chatpartner"));
    }

    #[test]
    fn secret_from_rejects_missing_and_blank() {
        assert!(matches!(
            secret_from(OPENAI_API_KEY_ENV, None),
            Err(ConfigError::MissingSecret(ref name)) if name == OPENAI_API_KEY_ENV
        ));
        assert!(secret_from(OPENAI_API_KEY_ENV, Some("  ".to_string())).is_err());
    }

    #[test]
    fn secret_from_trims_value() {
        let secret = secret_from(OPENAI_API_KEY_ENV, Some(" sk-abc \n".to_string())).unwrap();
        assert_eq!(secret.expose_secret(), "sk-abc");
    }
}
