use thiserror::Error;

/// Fatal setup errors. Per-claim and per-article failures never reach
/// this type; they are encoded into result records instead.
#[derive(Error, Debug)]
pub enum ClaimsiftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Invalid JSON input in {path}: {message}")]
    InvalidInput { path: String, message: String },

    #[error("No claims to process")]
    EmptyInput,

    #[error("Failed to write artifact {path}: {message}")]
    ArtifactWrite { path: String, message: String },
}
