//! Parser traits module for MeetSched
//!
//! This module defines the core traits and types for the parsing strategies,
//! providing a unified interface for the cascade to iterate over.

use crate::parser::time_parser::NormalizationError;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;

/// Fields extracted by a successful strategy attempt
///
/// The title is bare (it never embeds the attendee) and the person is the raw,
/// unresolved name as written by the user or the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMeeting {
    pub title: String,
    pub person: Option<String>,
    pub start: DateTime<Tz>,
    pub duration_minutes: Option<u32>,
}

/// Transient failure of an external dependency
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("language model is not configured")]
    Unavailable,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response is missing '{0}'")]
    MissingField(&'static str),
    #[error("unparsable datetime '{value}': {source}")]
    Datetime {
        value: String,
        #[source]
        source: NormalizationError,
    },
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else if err.is_decode() {
            UpstreamError::Malformed(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// Why a strategy did not produce a meeting
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input does not fit this strategy's grammar or schema
    #[error("no match")]
    NoMatch,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// The input matched but its time phrase could not be resolved
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// Capability shared by every parsing strategy
#[async_trait]
pub trait ParseStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Try to extract a meeting from `text`, resolving relative time against `reference_now`
    async fn attempt(
        &self,
        text: &str,
        reference_now: DateTime<Tz>,
    ) -> Result<ParsedMeeting, ParseError>;
}
