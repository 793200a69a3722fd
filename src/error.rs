//! Error types for Securiverse Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport not ready: {0}")]
    NotReady(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Backend rejected request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Engagement not loaded")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(e.to_string())
    }
}
