//! Image-generation side path.
//!
//! Independent of the conversation engine: a prompt goes to an external
//! image API and the returned picture is written to a timestamped file.

use std::path::PathBuf;

use chatpartner_types::error::ImageError;
use chatpartner_types::image::{GeneratedImage, image_file_name};
use chrono::Local;
use tracing::info;

/// Port for image-generation backends.
pub trait ImageGenerator: Send + Sync {
    /// Generate one picture for `prompt` and return its encoded bytes.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, ImageError>> + Send;
}

/// Generates pictures and stores them under an output directory.
pub struct PictureService<G: ImageGenerator> {
    generator: G,
    output_dir: PathBuf,
}

impl<G: ImageGenerator> PictureService<G> {
    pub fn new(generator: G, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Generate a picture and write it as `generated_image-<timestamp>.png`.
    #[tracing::instrument(name = "create_picture", skip(self))]
    pub async fn create(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ImageError::EmptyPrompt);
        }

        let bytes = self.generator.generate(prompt).await?;
        let created_at = Local::now();
        let path = self.output_dir.join(image_file_name(&created_at));

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ImageError::Io(e.to_string()))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ImageError::Io(e.to_string()))?;

        info!(path = %path.display(), bytes = bytes.len(), "picture saved");
        Ok(GeneratedImage {
            prompt: prompt.to_string(),
            path,
            created_at,
        })
    }
}
