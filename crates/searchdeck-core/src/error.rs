use thiserror::Error;

use crate::transport::UserId;

pub use searchdeck_client::ProviderError;

/// Failures of button-driven navigation. All of them are reported back to
/// the user as short notices.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no active session for user {user}")]
    NoActiveSession { user: UserId },
    #[error("page {index} moved by {delta} is outside 0..{chunk_count}")]
    OutOfRange {
        index: usize,
        delta: isize,
        chunk_count: usize,
    },
    #[error("article `{id}` is not cached")]
    ArticleNotFound { id: String },
    #[error("malformed action token `{token}`")]
    MalformedAction { token: String },
}

/// The transport could not deliver, edit or delete a message.
#[derive(Debug, Error)]
#[error("message delivery failed: {reason}")]
pub struct DeliveryError {
    pub reason: String,
}

impl DeliveryError {
    pub fn new(reason: impl std::fmt::Display) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
