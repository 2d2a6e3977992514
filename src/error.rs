//! Error types for cataloging and schema generation

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while cataloging resources or generating schemas
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid reference: {reference} is not under trusted base {base}")]
    InvalidReference { reference: String, base: String },

    #[error("Malformed schema at {reference}: {reason}")]
    MalformedSchema { reference: String, reason: String },

    #[error("No entry-point document found for base path '{base_path}' (looked for {searched})")]
    EntryPointNotFound { base_path: String, searched: String },

    #[error("Generation failed for '{base_path}': {message}")]
    Generation { base_path: String, message: String },

    #[error("Failed to fetch {uri}: {message}")]
    Fetch { uri: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<config_crate::ConfigError> for SchemaError {
    fn from(err: config_crate::ConfigError) -> Self {
        SchemaError::Config(err.to_string())
    }
}
