use thiserror::Error;

/// Errors from repository operations (used by trait definitions in chatpartner-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors while loading configuration or secrets.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("missing secret {0}; set it in the environment or in .env")]
    MissingSecret(String),
}

/// Errors from the image-generation side path.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image prompt is empty")]
    EmptyPrompt,

    #[error("image provider error: {0}")]
    Provider(String),

    #[error("image download failed: {0}")]
    Download(String),

    #[error("failed to write image: {0}")]
    Io(String),
}
