use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("unknown character '{token}'")]
    UnknownCharacter {
        token: String,
        suggestion: Option<String>,
    },
    #[error("failed to fetch card data: {0}")]
    Fetch(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request problems detected before any network access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("--limit must be a positive integer (got {0})")]
    NonPositiveLimit(i64),
    #[error("invalid rarity '{0}' (expected 1-5, bd or birthday)")]
    InvalidRarity(String),
    #[error("invalid attribute '{value}' (expected one of: {expected})")]
    InvalidAttribute { value: String, expected: String },
    #[error("unknown unit '{value}' (expected one of: {expected})")]
    UnknownUnit { value: String, expected: String },
    #[error("server '{server}' is not available for {game}")]
    UnsupportedServer { server: String, game: String },
    #[error("{game} has no skill descriptions to search")]
    SkillSearchUnsupported { game: String },
    #[error("specify a character, --prefix, --card-id, --unit or --skill-id")]
    MissingQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UnknownCharacter,
    Fetch,
    Config,
    Io,
}

impl CardError {
    pub fn fetch<T: Into<String>>(message: T) -> Self {
        CardError::Fetch(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CardError::Validation(_) => ErrorKind::Validation,
            CardError::UnknownCharacter { .. } => ErrorKind::UnknownCharacter,
            CardError::Fetch(_) | CardError::Http(_) | CardError::Json(_) => ErrorKind::Fetch,
            CardError::Config(_) => ErrorKind::Config,
            CardError::Io(_) => ErrorKind::Io,
        }
    }
}
