/// MeetSched parser module
///
/// This module holds the parsing strategies and the cascade that tries them in order.
pub mod pattern;
pub mod semantic;
pub mod time_parser;
pub mod traits;
pub mod utils;

use crate::contacts::{ContactResolver, UNNAMED};
use crate::meeting::{MeetingRequest, DEFAULT_DURATION_MINUTES};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use futures::FutureExt;
use log::{debug, error, info, warn};
use std::panic::AssertUnwindSafe;

pub use pattern::PatternParser;
pub use semantic::SemanticParser;
pub use time_parser::{NormalizationError, TemporalNormalizer};
pub use traits::{ParseError, ParseStrategy, ParsedMeeting, UpstreamError};

/// The closed set of strategies the cascade can run
pub enum Strategy {
    Semantic(SemanticParser),
    Pattern(PatternParser),
}

#[async_trait]
impl ParseStrategy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Semantic(parser) => parser.name(),
            Strategy::Pattern(parser) => parser.name(),
        }
    }

    async fn attempt(
        &self,
        text: &str,
        reference_now: DateTime<Tz>,
    ) -> Result<ParsedMeeting, ParseError> {
        match self {
            Strategy::Semantic(parser) => parser.attempt(text, reference_now).await,
            Strategy::Pattern(parser) => parser.attempt(text, reference_now).await,
        }
    }
}

/// Result of running the cascade over one request
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeOutcome {
    Succeeded(MeetingRequest),
    Exhausted,
}

/// Ordered fallback over the parsing strategies
///
/// The semantic strategy runs first because it tolerates unconstrained phrasing;
/// the pattern strategy is the deterministic safety net. The first strategy that
/// returns a title wins and no later strategy runs, even if that result turns out
/// to be unusable. Strategy failures are logged and never reach the caller.
pub struct ParseCascade {
    strategies: Vec<Strategy>,
    resolver: ContactResolver,
    default_duration_minutes: u32,
}

impl ParseCascade {
    pub fn new(semantic: SemanticParser, pattern: PatternParser, resolver: ContactResolver) -> Self {
        Self {
            strategies: vec![Strategy::Semantic(semantic), Strategy::Pattern(pattern)],
            resolver,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, text: &str, reference_now: DateTime<Tz>) -> CascadeOutcome {
        for strategy in &self.strategies {
            let name = strategy.name();
            let attempt = AssertUnwindSafe(strategy.attempt(text, reference_now)).catch_unwind().await;

            match attempt {
                Ok(Ok(parsed)) if !parsed.title.trim().is_empty() => {
                    info!("{} strategy matched: {:?}", name, parsed);
                    return self.finish(parsed);
                }
                Ok(Ok(_)) => debug!("{} strategy returned an empty title", name),
                Ok(Err(ParseError::NoMatch)) => debug!("{} strategy found no match", name),
                Ok(Err(ParseError::Upstream(e))) => warn!("{} strategy upstream failure: {}", name, e),
                Ok(Err(ParseError::Normalization(e))) => {
                    info!("{} strategy could not resolve the time: {}", name, e)
                }
                Err(_) => error!("{} strategy panicked; continuing", name),
            }
        }

        info!("All parsing strategies exhausted for: {}", text);
        CascadeOutcome::Exhausted
    }

    fn finish(&self, parsed: ParsedMeeting) -> CascadeOutcome {
        let person = match parsed.person.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => self.resolver.resolve(raw),
            _ => UNNAMED.to_string(),
        };
        let duration = parsed.duration_minutes.unwrap_or(self.default_duration_minutes);

        match MeetingRequest::new(parsed.title.trim(), person, parsed.start, duration) {
            Ok(request) => CascadeOutcome::Succeeded(request),
            Err(e) => {
                warn!("Matched request is unusable: {}", e);
                CascadeOutcome::Exhausted
            }
        }
    }
}
