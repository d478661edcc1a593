//! Time phrase normalization for MeetSched
//!
//! Turns loosely formatted time expressions ("tomorrow at 5pm", ISO-8601 strings,
//! "next Tuesday at 9:30am") into timezone-aware instants. Relative terms are resolved
//! against a caller-supplied reference instant taken in the configured zone.
//!
//! Matching is fuzzy: words around the date and time tokens are ignored. A phrase
//! that contains no date or time token at all is an error, never "now".

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;
use log::debug;
use once_cell::sync::Lazy;
use phf::phf_map;
use regex::{Captures, Regex};

/// Errors produced while normalizing a time phrase
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("no recognizable date or time in '{0}'")]
    NoTemporalToken(String),
    #[error("invalid date or time in '{0}'")]
    InvalidDateTime(String),
    #[error("local time {0} does not exist in {1}")]
    NonexistentLocalTime(NaiveDateTime, Tz),
}

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").unwrap());

const MONTHS: &str = "january|jan|february|feb|march|mar|april|apr|may|june|jun|july|jul|august|aug|september|sept|sep|october|oct|november|nov|december|dec";

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s*(\d{{4}})\b)?",
        MONTHS
    ))
    .unwrap()
});

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({})\b(?:,?\s*(\d{{4}})\b)?",
        MONTHS
    ))
    .unwrap()
});

static RELATIVE_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(day\s+after\s+tomorrow|tomorrow|today|tonight)\b").unwrap());

static RELATIVE_OFFSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bin\s+(\d{1,4})\s*(minutes?|mins?|hours?|hrs?|days?|weeks?)\b").unwrap()
});

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(this|next|coming)\s+)?(monday|mon|tuesday|tues|tue|wednesday|weds|wed|thursday|thurs|thur|thu|friday|fri|saturday|sunday)\b",
    )
    .unwrap()
});

static CLOCK_12H: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b").unwrap());

static CLOCK_24H: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());

static NAMED_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(noon|midday|midnight)\b").unwrap());

static DAY_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(morning|afternoon|evening|night)\b").unwrap());

// Text shaped like an ISO-8601 timestamp; never handed to the fuzzy matcher
static ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\d{4}-\d{1,2}-\d{1,2}(?:t|\s+\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?\s*(?:z|[+-]\d[\d:]*)$)",
    )
    .unwrap()
});

static TZ_ABBR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([a-z]{3,4})\b").unwrap());

// Timezone abbreviations accepted after a clock time
const TIMEZONE_ABBR_MAP: phf::Map<&'static str, Tz> = phf_map! {
    "PST" => Tz::America__Los_Angeles,
    "PDT" => Tz::America__Los_Angeles,
    "PT" => Tz::America__Los_Angeles,
    "MST" => Tz::America__Denver,
    "MDT" => Tz::America__Denver,
    "CST" => Tz::America__Chicago,
    "CDT" => Tz::America__Chicago,
    "EST" => Tz::America__New_York,
    "EDT" => Tz::America__New_York,
    "ET" => Tz::America__New_York,
    "AKST" => Tz::America__Anchorage,
    "AKDT" => Tz::America__Anchorage,
    "HST" => Tz::Pacific__Honolulu,
    "GMT" => Tz::Etc__GMT,
    "BST" => Tz::Europe__London,
    "IST" => Tz::Asia__Kolkata,
    "CET" => Tz::Europe__Berlin,
    "CEST" => Tz::Europe__Berlin,
    "EET" => Tz::Europe__Helsinki,
    "EEST" => Tz::Europe__Helsinki,
    "MSK" => Tz::Europe__Moscow,
    "AEST" => Tz::Australia__Sydney,
    "AEDT" => Tz::Australia__Sydney,
    "AWST" => Tz::Australia__Perth,
    "NZST" => Tz::Pacific__Auckland,
    "NZDT" => Tz::Pacific__Auckland,
    "JST" => Tz::Asia__Tokyo,
    "KST" => Tz::Asia__Seoul,
    "UTC" => Tz::UTC,
};

/// Map a timezone abbreviation such as "PST" to a zone
pub fn map_timezone_abbr(abbr: &str) -> Option<Tz> {
    TIMEZONE_ABBR_MAP.get(abbr.to_uppercase().as_str()).copied()
}

/// Offset-carrying ISO-8601 layouts tried after RFC 3339. `%#z` also accepts
/// "Z", hour-only offsets ("+02") and offsets with or without a colon.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Naive ISO-8601 layouts; the configured zone is attached to these
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Resolves free-text time phrases into instants in one configured zone
#[derive(Debug, Clone, Copy)]
pub struct TemporalNormalizer {
    zone: Tz,
}

impl TemporalNormalizer {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Normalize `phrase` into an instant in the configured zone.
    ///
    /// Explicit offsets are honoured and converted into the configured zone; phrases
    /// without one are interpreted as local time in that zone.
    pub fn normalize(
        &self,
        phrase: &str,
        reference_now: DateTime<Tz>,
    ) -> Result<DateTime<Tz>, NormalizationError> {
        let trimmed = phrase.trim();
        debug!("Normalizing time phrase: '{}'", trimmed);

        if let Some(result) = self.parse_exact(trimmed) {
            return result;
        }
        if ISO_TIMESTAMP.is_match(trimmed) {
            debug!("Rejecting unsupported ISO-8601 layout: '{}'", trimmed);
            return Err(NormalizationError::InvalidDateTime(trimmed.to_string()));
        }

        let reference_now = reference_now.with_timezone(&self.zone);
        self.parse_fuzzy(trimmed, reference_now)
    }

    /// Strict ISO-8601 parsing. Returns `None` when the text is not an ISO timestamp.
    fn parse_exact(&self, text: &str) -> Option<Result<DateTime<Tz>, NormalizationError>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Ok(dt.with_timezone(&self.zone)));
        }
        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(text, format) {
                return Some(Ok(dt.with_timezone(&self.zone)));
            }
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Some(localize(self.zone, naive));
            }
        }
        if let Some(utc) = text.strip_suffix(['Z', 'z']) {
            for format in NAIVE_FORMATS {
                if let Ok(naive) = NaiveDateTime::parse_from_str(utc, format) {
                    return Some(Ok(self.zone.from_utc_datetime(&naive)));
                }
            }
        }
        None
    }

    fn parse_fuzzy(
        &self,
        phrase: &str,
        reference_now: DateTime<Tz>,
    ) -> Result<DateTime<Tz>, NormalizationError> {
        let lower = phrase.to_lowercase();
        let today = reference_now.date_naive();
        let invalid = || NormalizationError::InvalidDateTime(phrase.to_string());

        // "in 20 minutes" / "in 2 hours" name an instant outright
        if let Some(caps) = RELATIVE_OFFSET.captures(&lower) {
            let amount: i64 = caps[1].parse().map_err(|_| invalid())?;
            let unit = &caps[2];
            if unit.starts_with('m') || unit.starts_with('h') {
                let offset = if unit.starts_with('h') {
                    Duration::hours(amount)
                } else {
                    Duration::minutes(amount)
                };
                debug!("Relative offset {} {} from reference", amount, unit);
                return Ok(reference_now + offset);
            }
        }

        let date = extract_date(&lower, today, reference_now.year()).transpose().map_err(|_| invalid())?;
        let clock = extract_clock(&lower).transpose().map_err(|_| invalid())?;
        let time = clock.or_else(|| extract_day_part(&lower));

        if date.is_none() && time.is_none() {
            return Err(NormalizationError::NoTemporalToken(phrase.to_string()));
        }

        let naive = NaiveDateTime::new(date.unwrap_or(today), time.unwrap_or(NaiveTime::MIN));
        debug!("Fuzzy match '{}' -> {}", phrase, naive);

        // A zone abbreviation only qualifies an explicit clock time
        if clock.is_some() {
            if let Some(source) = extract_zone_abbr(&lower) {
                debug!("Interpreting '{}' in {}", phrase, source.name());
                return Ok(localize(source, naive)?.with_timezone(&self.zone));
            }
        }

        localize(self.zone, naive)
    }
}

/// Attach `zone` to a naive local time, picking the earlier instant across a DST fold
pub fn localize(zone: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, NormalizationError> {
    zone.from_local_datetime(&naive)
        .earliest()
        .ok_or(NormalizationError::NonexistentLocalTime(naive, zone))
}

/// Marker for a date or time token that was found but does not name a real value
#[derive(Debug)]
struct OutOfRange;

fn extract_date(
    lower: &str,
    today: NaiveDate,
    reference_year: i32,
) -> Option<Result<NaiveDate, OutOfRange>> {
    if let Some(caps) = ISO_DATE.captures(lower) {
        return Some(ymd(number(&caps, 1), number(&caps, 2), number(&caps, 3)));
    }

    if let Some(caps) = SLASH_DATE.captures(lower) {
        let year = caps.get(3).map_or(reference_year, |m| {
            let y: i32 = m.as_str().parse().unwrap_or(reference_year);
            if m.as_str().len() == 2 { 2000 + y } else { y }
        });
        return Some(ymd(year as u32, number(&caps, 1), number(&caps, 2)));
    }

    if let Some(caps) = MONTH_DAY.captures(lower) {
        let year = caps.get(3).map_or(reference_year as u32, |m| m.as_str().parse().unwrap_or(0));
        return Some(ymd(year, month_number(&caps[1]), number(&caps, 2)));
    }

    if let Some(caps) = DAY_MONTH.captures(lower) {
        let year = caps.get(3).map_or(reference_year as u32, |m| m.as_str().parse().unwrap_or(0));
        return Some(ymd(year, month_number(&caps[2]), number(&caps, 1)));
    }

    if let Some(caps) = RELATIVE_DAY.captures(lower) {
        let days = match &caps[1] {
            "tomorrow" => 1,
            "today" | "tonight" => 0,
            _ => 2,
        };
        return Some(Ok(today + Duration::days(days)));
    }

    if let Some(caps) = RELATIVE_OFFSET.captures(lower) {
        let amount: i64 = caps[1].parse().unwrap_or(0);
        let days = if caps[2].starts_with('w') { amount * 7 } else { amount };
        return Some(Ok(today + Duration::days(days)));
    }

    if let Some(caps) = WEEKDAY.captures(lower) {
        let target = weekday_from_name(&caps[2])?;
        let strictly_after = caps.get(1).is_some_and(|m| m.as_str() == "next");
        return Some(Ok(upcoming_weekday(today, target, strictly_after)));
    }

    None
}

fn extract_clock(lower: &str) -> Option<Result<NaiveTime, OutOfRange>> {
    if let Some(caps) = CLOCK_12H.captures(lower) {
        let hour = number(&caps, 1);
        let minute = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(60));
        if !(1..=12).contains(&hour) {
            return Some(Err(OutOfRange));
        }
        let hour_24 = match (hour, &caps[3]) {
            (12, "a") => 0,
            (12, _) => 12,
            (h, "p") => h + 12,
            (h, _) => h,
        };
        return Some(NaiveTime::from_hms_opt(hour_24, minute, 0).ok_or(OutOfRange));
    }

    if let Some(caps) = CLOCK_24H.captures(lower) {
        return Some(NaiveTime::from_hms_opt(number(&caps, 1), number(&caps, 2), 0).ok_or(OutOfRange));
    }

    if let Some(caps) = NAMED_TIME.captures(lower) {
        let hour = if &caps[1] == "midnight" { 0 } else { 12 };
        return Some(NaiveTime::from_hms_opt(hour, 0, 0).ok_or(OutOfRange));
    }

    None
}

fn extract_day_part(lower: &str) -> Option<NaiveTime> {
    let hour = match DAY_PART.captures(lower).as_ref().map(|caps| &caps[1]) {
        Some("morning") => 9,
        Some("afternoon") => 14,
        Some("evening") => 19,
        Some(_) => 20,
        None if RELATIVE_DAY.captures(lower).is_some_and(|caps| &caps[1] == "tonight") => 20,
        None => return None,
    };
    NaiveTime::from_hms_opt(hour, 0, 0)
}

fn extract_zone_abbr(lower: &str) -> Option<Tz> {
    TZ_ABBR
        .captures_iter(lower)
        .find_map(|caps| map_timezone_abbr(&caps[1]))
        .or_else(|| {
            // two-letter forms are too common as words to scan for in general
            lower.split_whitespace().find_map(|word| match word {
                "pt" | "et" => map_timezone_abbr(word),
                _ => None,
            })
        })
}

fn number(caps: &Captures<'_>, index: usize) -> u32 {
    caps.get(index).and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
}

fn ymd(year: u32, month: u32, day: u32) -> Result<NaiveDate, OutOfRange> {
    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or(OutOfRange)
}

fn month_number(name: &str) -> u32 {
    match &name[..3] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        _ => 12,
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.get(..3)? {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// The next `target` on or after `from`; strictly after when `strictly_after` is set
fn upcoming_weekday(from: NaiveDate, target: Weekday, strictly_after: bool) -> NaiveDate {
    let current = from.weekday().num_days_from_monday() as i64;
    let wanted = target.num_days_from_monday() as i64;
    let mut ahead = (wanted - current).rem_euclid(7);
    if ahead == 0 && strictly_after {
        ahead = 7;
    }
    from + Duration::days(ahead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::US::Pacific;

    fn reference() -> DateTime<Tz> {
        // Monday
        Pacific.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
    }

    fn normalize(phrase: &str) -> Result<DateTime<Tz>, NormalizationError> {
        TemporalNormalizer::new(Pacific).normalize(phrase, reference())
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        Pacific.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_tomorrow_at_time() {
        assert_eq!(normalize("tomorrow at 5pm").unwrap(), local(2026, 10, 20, 17, 0));
    }

    #[test]
    fn test_time_without_date_is_reference_day() {
        assert_eq!(normalize("2pm").unwrap(), local(2026, 10, 19, 14, 0));
        assert_eq!(normalize("at 9:30 a.m.").unwrap(), local(2026, 10, 19, 9, 30));
        assert_eq!(normalize("17:45").unwrap(), local(2026, 10, 19, 17, 45));
    }

    #[test]
    fn test_date_without_time_is_midnight() {
        assert_eq!(normalize("tomorrow").unwrap(), local(2026, 10, 20, 0, 0));
        assert_eq!(normalize("2026-11-03").unwrap(), local(2026, 11, 3, 0, 0));
    }

    #[test]
    fn test_weekdays() {
        // reference is a Monday
        assert_eq!(normalize("next Tuesday at 9:30am").unwrap(), local(2026, 10, 20, 9, 30));
        assert_eq!(normalize("on Monday at 3pm").unwrap(), local(2026, 10, 19, 15, 0));
        assert_eq!(normalize("next monday at 3pm").unwrap(), local(2026, 10, 26, 15, 0));
        assert_eq!(normalize("friday noon").unwrap(), local(2026, 10, 23, 12, 0));
    }

    #[test]
    fn test_month_names_and_slashes() {
        assert_eq!(normalize("March 5 at 10am").unwrap(), local(2026, 3, 5, 10, 0));
        assert_eq!(normalize("the 5th of december, 2027 at 4pm").unwrap(), local(2027, 12, 5, 16, 0));
        assert_eq!(normalize("11/2 at 8am").unwrap(), local(2026, 11, 2, 8, 0));
    }

    #[test]
    fn test_day_parts() {
        assert_eq!(normalize("tomorrow morning").unwrap(), local(2026, 10, 20, 9, 0));
        assert_eq!(normalize("tonight").unwrap(), local(2026, 10, 19, 20, 0));
        assert_eq!(normalize("day after tomorrow afternoon").unwrap(), local(2026, 10, 21, 14, 0));
    }

    #[test]
    fn test_relative_offsets() {
        assert_eq!(normalize("in 90 minutes").unwrap(), local(2026, 10, 19, 11, 30));
        assert_eq!(normalize("in 2 days at 1pm").unwrap(), local(2026, 10, 21, 13, 0));
    }

    #[test]
    fn test_iso_with_offset_converts_without_losing_precision() {
        let result = normalize("2026-10-20T12:34:56.789+00:00").unwrap();
        assert_eq!(result.timezone(), Pacific);
        assert_eq!(result.hour(), 5);
        assert_eq!(result.nanosecond(), 789_000_000);
        let expected = DateTime::parse_from_rfc3339("2026-10-20T12:34:56.789Z").unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_iso_offset_variants_keep_the_offset() {
        let expected = local(2026, 10, 20, 8, 0);
        assert_eq!(normalize("2026-10-20T17:00:00+02").unwrap(), local(2026, 10, 20, 8, 0));
        assert_eq!(normalize("2026-10-20T15:00Z").unwrap(), expected);
        assert_eq!(normalize("2026-10-20 15:00:00+0000").unwrap(), expected);

        let result = normalize("2026-10-20T12:34:56.789+0000").unwrap();
        assert_eq!(result.nanosecond(), 789_000_000);
        assert_eq!(result.hour(), 5);
    }

    #[test]
    fn test_malformed_iso_is_never_guessed() {
        assert!(matches!(
            normalize("2026-10-20T17:00:00+2"),
            Err(NormalizationError::InvalidDateTime(_))
        ));
        assert!(matches!(normalize("2026-10-20Tlater"), Err(NormalizationError::InvalidDateTime(_))));
        // a plain date is still a fuzzy phrase
        assert_eq!(normalize("2026-10-20 at 5pm").unwrap(), local(2026, 10, 20, 17, 0));
    }

    #[test]
    fn test_naive_iso_gets_configured_zone() {
        assert_eq!(normalize("2026-10-20T17:00:00").unwrap(), local(2026, 10, 20, 17, 0));
        assert_eq!(normalize("2026-10-20T17:00").unwrap(), local(2026, 10, 20, 17, 0));
    }

    #[test]
    fn test_zone_abbreviation_is_converted() {
        // 5pm Eastern is 2pm Pacific
        assert_eq!(normalize("tomorrow at 5pm EST").unwrap(), local(2026, 10, 20, 14, 0));
    }

    #[test]
    fn test_no_temporal_token_is_an_error() {
        assert!(matches!(
            normalize("not a date at all"),
            Err(NormalizationError::NoTemporalToken(_))
        ));
        assert!(matches!(normalize(""), Err(NormalizationError::NoTemporalToken(_))));
    }

    #[test]
    fn test_out_of_range_values_are_errors() {
        assert!(matches!(normalize("13pm"), Err(NormalizationError::InvalidDateTime(_))));
        assert!(matches!(normalize("February 30"), Err(NormalizationError::InvalidDateTime(_))));
    }

    #[test]
    fn test_nonexistent_local_time() {
        // spring-forward gap in 2027
        let naive = NaiveDate::from_ymd_opt(2027, 3, 14).unwrap().and_hms_opt(2, 30, 0).unwrap();
        assert!(matches!(
            localize(Pacific, naive),
            Err(NormalizationError::NonexistentLocalTime(_, _))
        ));
    }

    #[test]
    fn test_map_timezone_abbr() {
        assert_eq!(map_timezone_abbr("pst"), Some(Tz::America__Los_Angeles));
        assert_eq!(map_timezone_abbr("CET"), Some(Tz::Europe__Berlin));
        assert_eq!(map_timezone_abbr("XYZ"), None);
    }
}
