use crate::composer::OutboundEvent;
use async_trait::async_trait;

mod google;
mod token;

pub use google::{GoogleCalendarClient, DEFAULT_API_BASE_URL};
pub use token::{ClientSecret, StoredToken, TokenStore};

/// Custom error type for calendar operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("calendar request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("calendar API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected calendar response: {0}")]
    InvalidResponse(String),
    #[error("token storage error: {0}")]
    TokenStorage(String),
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CalendarError::Timeout
        } else if err.is_decode() {
            CalendarError::InvalidResponse(err.to_string())
        } else {
            CalendarError::Transport(err.to_string())
        }
    }
}

/// The external service that persists events
#[async_trait]
pub trait CalendarCollaborator: Send + Sync {
    /// Create `event` and return a reference link to it
    async fn create_event(&self, event: &OutboundEvent) -> Result<String, CalendarError>;
}
