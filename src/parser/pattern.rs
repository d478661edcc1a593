//! Pattern-based meeting parser
//!
//! The deterministic fallback strategy. It recognises one constrained family of
//! phrasings:
//!
//! ```text
//! set a <title-words> [meeting|call|appointment] [with <person>] [on|at] <time-phrase>
//!     [for <N> minutes|mins|hours|hrs|hr]
//! ```
//!
//! Input outside that grammar is reported as no match; it is never guessed at.

use crate::parser::time_parser::TemporalNormalizer;
use crate::parser::traits::{ParseError, ParseStrategy, ParsedMeeting};
use crate::parser::utils::capitalize_first;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bset\s+(?:up\s+)?an?\s+").unwrap());

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+for\s+(\d+)\s*(minutes?|mins?|hours?|hrs?|hr)$").unwrap()
});

static TITLE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w:/+\- ]+$").unwrap());

// Tokens that look like a clock time or a date: "5pm", "9:30", "10/3", "2026-10-20"
static TEMPORAL_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\d{1,2}(?::\d{2})?(?:[ap]\.?m\.?)?|\d{1,2}/\d{1,2}(?:/\d{2,4})?|\d{4}-\d{1,2}-\d{1,2})$")
        .unwrap()
});

const EVENT_NOUNS: &[&str] = &["meeting", "call", "appointment"];

// Words that open a time phrase
const TIME_KEYWORDS: &[&str] = &[
    "on", "at", "today", "tomorrow", "tonight", "next", "this", "coming", "noon", "midnight",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Raw fields recovered from a grammar match, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub title_prefix: String,
    pub person_raw: Option<String>,
    pub time_phrase: String,
    pub duration_minutes: Option<u32>,
}

/// Regex/structural strategy over the fixed "set a ..." grammar
#[derive(Debug, Clone)]
pub struct PatternParser {
    normalizer: TemporalNormalizer,
}

impl PatternParser {
    pub fn new(normalizer: TemporalNormalizer) -> Self {
        Self { normalizer }
    }

    /// Match `text` against the grammar without interpreting the time phrase
    pub fn match_grammar(text: &str) -> Option<PatternMatch> {
        let text = text.trim().trim_end_matches(['.', '!', '?']).trim_end();
        let head = HEAD.find(text)?;
        let mut body = &text[head.end()..];

        let mut duration_minutes = None;
        if let Some(caps) = DURATION.captures(body) {
            let amount: u32 = caps[1].parse().ok()?;
            let unit = caps[2].to_lowercase();
            duration_minutes = Some(if unit.starts_with('h') { amount.checked_mul(60)? } else { amount });
            body = &body[..caps.get(0).map_or(body.len(), |m| m.start())];
        }

        let tokens: Vec<&str> = body.split_whitespace().collect();
        let mut index = title_end(&tokens);

        let title = tokens[..index].join(" ");
        if title.is_empty() || !TITLE_CHARS.is_match(&title) {
            debug!("Pattern parser: no usable title in '{}'", text);
            return None;
        }

        let mut person_words = Vec::new();
        if tokens.get(index).is_some_and(|t| t.eq_ignore_ascii_case("with")) {
            index += 1;
            while let Some(token) = tokens.get(index) {
                let lower = token.to_lowercase();
                if opens_time_phrase(&lower) || lower == "in" {
                    break;
                }
                // the name ends at the first '@' or digit
                if let Some(cut) = token.find(|c: char| c == '@' || c.is_ascii_digit()) {
                    if cut > 0 {
                        person_words.push(&token[..cut]);
                        index += 1;
                    }
                    break;
                }
                person_words.push(*token);
                index += 1;
            }
        }
        let person_raw = if person_words.is_empty() { None } else { Some(person_words.join(" ")) };

        let mut rest = &tokens[index.min(tokens.len())..];
        if rest.first().is_some_and(|t| t.eq_ignore_ascii_case("on") || t.eq_ignore_ascii_case("at")) {
            rest = &rest[1..];
        }
        let time_phrase = rest.join(" ");
        if time_phrase.is_empty() {
            debug!("Pattern parser: no time phrase in '{}'", text);
            return None;
        }

        Some(PatternMatch {
            title_prefix: capitalize_first(&title),
            person_raw,
            time_phrase,
            duration_minutes,
        })
    }
}

/// Number of leading tokens that make up the title.
///
/// The title runs greedily up to the last event noun before "with" or the first
/// clock/date token, so nouns and time words may appear inside it. Without an
/// event noun it stops at "with" or the first word that opens a time phrase.
fn title_end(tokens: &[&str]) -> usize {
    let boundary = tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("with") || TEMPORAL_TOKEN.is_match(t))
        .unwrap_or(tokens.len());

    let last_noun = tokens[..boundary]
        .iter()
        .rposition(|t| EVENT_NOUNS.contains(&t.to_lowercase().as_str()));
    if let Some(noun) = last_noun {
        return noun + 1;
    }

    tokens
        .iter()
        .position(|t| {
            let lower = t.to_lowercase();
            lower == "with" || opens_time_phrase(&lower)
        })
        .unwrap_or(tokens.len())
}

fn opens_time_phrase(lower: &str) -> bool {
    TIME_KEYWORDS.contains(&lower) || TEMPORAL_TOKEN.is_match(lower)
}

#[async_trait]
impl ParseStrategy for PatternParser {
    fn name(&self) -> &'static str {
        "pattern"
    }

    async fn attempt(
        &self,
        text: &str,
        reference_now: DateTime<Tz>,
    ) -> Result<ParsedMeeting, ParseError> {
        let matched = Self::match_grammar(text).ok_or(ParseError::NoMatch)?;
        debug!("Pattern parser matched: {:?}", matched);

        let start = self.normalizer.normalize(&matched.time_phrase, reference_now)?;

        Ok(ParsedMeeting {
            title: matched.title_prefix,
            person: matched.person_raw,
            start,
            duration_minutes: matched.duration_minutes,
        })
    }
}
