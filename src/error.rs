use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefineryError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("unsupported document format: '{0}' (supported: pdf, docx)")]
    UnsupportedFormat(String),

    #[error("document parsing failed: {0}")]
    Parse(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("lookup collaborator failed: {0}")]
    Lookup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RefineryError>;
