use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredlogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid topic id: {0}")]
    InvalidTopicId(String),

    #[error("Invalid consensus timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Submit error: {0}")]
    Submit(String),

    #[error("Envelope error: {0}")]
    Envelope(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for CredlogError {
    fn from(err: serde_json::Error) -> Self {
        CredlogError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CredlogError>;

// Domain misses ("institution not found") are not errors: query methods
// return `Ok(None)` or an empty list. Only transport, configuration and
// write-path failures travel through `CredlogError`.
