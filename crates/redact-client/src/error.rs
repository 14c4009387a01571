//! Error types for redact-client

use redact_core::RedactError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Backend returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Backend rejected request: {0}")]
    Rejected(String),

    #[error("Malformed backend response: {0}")]
    Decode(String),
}

impl From<ClientError> for RedactError {
    fn from(err: ClientError) -> Self {
        match err {
            // keep the backend's own wording for user-facing messages
            ClientError::Service { message, .. } | ClientError::Rejected(message) => {
                RedactError::ExternalCall(message)
            }
            other => RedactError::ExternalCall(other.to_string()),
        }
    }
}
