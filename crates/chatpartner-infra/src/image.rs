//! OpenAI image-generation client.
//!
//! `POST {base_url}/images/generations` returns a URL per picture; the
//! picture is then downloaded from that URL.

use chatpartner_core::picture::ImageGenerator;
use chatpartner_types::config::ImageSettings;
use chatpartner_types::error::ImageError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::llm::openai_compat::OPENAI_BASE_URL;

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedUrl>,
}

#[derive(Debug, Deserialize)]
struct GeneratedUrl {
    url: Option<String>,
}

/// Image generator for the OpenAI images API.
///
/// Does NOT derive Debug: holds the API key.
pub struct OpenAiImageGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    settings: ImageSettings,
}

impl OpenAiImageGenerator {
    pub fn new(api_key: SecretString, settings: ImageSettings, base_url: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            settings,
        }
    }

    fn generations_url(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }

    async fn request_url(&self, prompt: &str) -> Result<String, ImageError> {
        let body = GenerationRequest {
            model: &self.settings.model,
            prompt,
            n: 1,
            size: &self.settings.size,
        };

        let response = self
            .http
            .post(self.generations_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ImageError::Provider(format!("{status}: {text}")));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ImageError::Provider(format!("invalid response: {e}")))?;

        first_url(parsed)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Download(e.to_string()))?
            .error_for_status()
            .map_err(|e| ImageError::Download(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn first_url(response: GenerationResponse) -> Result<String, ImageError> {
    response
        .data
        .into_iter()
        .find_map(|d| d.url)
        .ok_or_else(|| ImageError::Provider("response contained no image url".to_string()))
}

impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        let url = self.request_url(prompt).await?;
        tracing::debug!(model = %self.settings.model, "image generated, downloading");
        self.download(&url).await
    }
}
