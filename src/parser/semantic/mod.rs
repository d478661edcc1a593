//! Semantic parser module for MeetSched
//!
//! Delegates extraction to a language model, asking for a strict JSON payload,
//! then treats the reply as untrusted text: fences are stripped, the schema is
//! checked and the datetime is run through the time normalizer.

use crate::parser::time_parser::TemporalNormalizer;
use crate::parser::traits::{ParseError, ParseStrategy, ParsedMeeting, UpstreamError};
use crate::parser::utils::{sanitize_user_input, strip_code_fences};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use log::{debug, warn};
use lru::LruCache;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Mutex;

pub mod api;

pub use api::{LanguageModel, OpenAiClient};

pub const SYSTEM_PROMPT: &str = "You are a scheduling assistant. Respond with pure JSON only.";

const MAX_INPUT_CHARS: usize = 1000;
const DEFAULT_CACHE_SIZE: usize = 100;

/// Shape requested from the model. Every field is optional here so that schema
/// violations can be reported precisely instead of as a decode failure.
#[derive(Debug, Deserialize)]
struct SemanticPayload {
    title: Option<String>,
    person: Option<String>,
    datetime: Option<String>,
    #[serde(default)]
    duration: Option<Value>,
}

/// Strategy backed by an external text-understanding service
pub struct SemanticParser {
    model: Option<Box<dyn LanguageModel>>,
    normalizer: TemporalNormalizer,
    cache: Mutex<LruCache<String, String>>,
}

impl SemanticParser {
    /// Create a parser. Without a model every attempt reports the service as unavailable.
    pub fn new(model: Option<Box<dyn LanguageModel>>, normalizer: TemporalNormalizer) -> Self {
        Self::with_cache_size(model, normalizer, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(
        model: Option<Box<dyn LanguageModel>>,
        normalizer: TemporalNormalizer,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self { model, normalizer, cache: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    fn cached_response(&self, key: &str) -> Option<String> {
        self.cache.lock().ok().and_then(|mut cache| cache.get(key).cloned())
    }

    fn remember_response(&self, key: String, response: String) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, response);
        }
    }

    /// Validate and repair a model response into parsed fields
    fn interpret(
        &self,
        response: &str,
        reference_now: DateTime<Tz>,
    ) -> Result<ParsedMeeting, ParseError> {
        let payload: SemanticPayload = serde_json::from_str(strip_code_fences(response))
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        let title = payload.title.ok_or(UpstreamError::MissingField("title"))?;
        let datetime = payload.datetime.ok_or(UpstreamError::MissingField("datetime"))?;

        let person = payload
            .person
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("unnamed"));
        let title = bare_title(title.trim(), person.as_deref());
        if title.is_empty() {
            return Err(ParseError::NoMatch);
        }

        let start = self
            .normalizer
            .normalize(&datetime, reference_now)
            .map_err(|source| UpstreamError::Datetime { value: datetime.clone(), source })?;

        Ok(ParsedMeeting {
            title,
            person,
            start,
            duration_minutes: payload.duration.as_ref().and_then(repair_duration),
        })
    }
}

/// Build the user instruction anchored on the reference date
pub fn build_prompt(text: &str, reference_now: DateTime<Tz>) -> String {
    format!(
        "Assume today's date is {} ({}). Extract the meeting details from this input. \
Return ONLY a JSON object with exactly these keys: title (the meeting subject, without the attendee's name), \
person (name only), datetime (ISO 8601), duration (minutes; default to 30 if not provided).\nInput: '{}'",
        reference_now.format("%Y-%m-%d"),
        reference_now.format("%A"),
        text
    )
}

/// Drop a trailing "with <person>" the model may have folded into the title
fn bare_title(title: &str, person: Option<&str>) -> String {
    if let Some(person) = person {
        let suffix = format!(" with {}", person);
        let split = title.len().saturating_sub(suffix.len());
        if let (Some(head), Some(tail)) = (title.get(..split), title.get(split..)) {
            if tail.eq_ignore_ascii_case(&suffix) {
                return head.trim().to_string();
            }
        }
    }
    title.to_string()
}

/// Accept a non-negative number or numeric string; anything else falls back to the default.
/// Zero is passed through so the cascade can reject it.
fn repair_duration(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches(|c: char| c.is_alphabetic()).trim().parse().ok(),
        _ => None,
    };
    match minutes {
        Some(m) if m >= 0.0 && m <= u32::MAX as f64 => Some(m.round() as u32),
        _ => {
            warn!("Ignoring unusable duration from model: {}", value);
            None
        }
    }
}

#[async_trait]
impl ParseStrategy for SemanticParser {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn attempt(
        &self,
        text: &str,
        reference_now: DateTime<Tz>,
    ) -> Result<ParsedMeeting, ParseError> {
        let model = self.model.as_deref().ok_or(UpstreamError::Unavailable)?;

        let sanitized = sanitize_user_input(text);
        if sanitized.is_empty() || sanitized.chars().count() > MAX_INPUT_CHARS {
            debug!("Semantic parser: input empty or too long");
            return Err(ParseError::NoMatch);
        }

        let reference_now = reference_now.with_timezone(&self.normalizer.zone());
        let prompt = build_prompt(&sanitized, reference_now);
        debug!("Prompt to language model: {}", prompt);

        let key = format!("{}|{}", reference_now.format("%Y-%m-%d"), sanitized);
        if let Some(response) = self.cached_response(&key) {
            debug!("Using cached response for: {}", key);
            return self.interpret(&response, reference_now);
        }

        let response = model.complete(SYSTEM_PROMPT, &prompt).await?;
        debug!("Raw model response: {}", response);

        // only responses that validate are worth replaying
        let parsed = self.interpret(&response, reference_now)?;
        self.remember_response(key, response);
        Ok(parsed)
    }
}
