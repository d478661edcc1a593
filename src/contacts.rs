//! Contact name resolution for MeetSched
//!
//! Maps nicknames to canonical display names using the configured directory.

use crate::parser::utils::title_case;
use log::debug;
use std::collections::HashMap;

/// Placeholder used when a request names no attendee
pub const UNNAMED: &str = "Unnamed";

/// Read-only nickname table, keyed by lowercase nickname
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    entries: HashMap<String, String>,
}

impl ContactDirectory {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(nickname, name)| (nickname.as_ref().trim().to_lowercase(), name.into()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, nickname: &str) -> Option<&str> {
        self.entries.get(&nickname.trim().to_lowercase()).map(String::as_str)
    }
}

/// Resolves raw name tokens to display names
#[derive(Debug, Clone)]
pub struct ContactResolver {
    directory: ContactDirectory,
}

impl ContactResolver {
    pub fn new(directory: ContactDirectory) -> Self {
        Self { directory }
    }

    /// Canonical name on a directory hit, otherwise the input in title case.
    ///
    /// Callers substitute [`UNNAMED`] for absent names instead of resolving empty text.
    pub fn resolve(&self, raw: &str) -> String {
        match self.directory.get(raw) {
            Some(canonical) => {
                debug!("Resolved contact '{}' -> '{}'", raw.trim(), canonical);
                canonical.to_string()
            }
            None => title_case(raw.trim()),
        }
    }
}
