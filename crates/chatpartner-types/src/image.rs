//! Generated picture metadata.

use std::path::PathBuf;

use chrono::{DateTime, Local};

/// Strftime pattern of the timestamp embedded in picture file names.
pub const IMAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// A picture written to disk by the image-generation side path.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub prompt: String,
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
}

/// File name for a picture generated at `at`.
///
/// Format: `generated_image-YYYY-MM-DD-HH-MM-SS.png`
pub fn image_file_name(at: &DateTime<Local>) -> String {
    format!("generated_image-{}.png", at.format(IMAGE_TIMESTAMP_FORMAT))
}
