//! Startup context shared by the scheduler and the interactive loop.

use crate::calendar::{CalendarCollaborator, GoogleCalendarClient};
use crate::config::Config;
use crate::contacts::{ContactDirectory, ContactResolver};
use crate::parser::semantic::{LanguageModel, OpenAiClient};
use crate::parser::{ParseCascade, PatternParser, SemanticParser, TemporalNormalizer};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use log::{info, warn};
use secrecy::SecretString;
use std::time::Duration;

/// Immutable settings resolved once at startup
pub struct AppContext {
    pub config: Config,
    pub timezone: Tz,
    pub contacts: ContactDirectory,
    api_key: Option<SecretString>,
    offline: bool,
}

impl AppContext {
    pub fn new(config: Config, api_key: Option<SecretString>) -> Result<Self> {
        config.validate()?;
        let timezone = config.timezone()?;
        let contacts = ContactDirectory::new(config.contacts.iter());
        Ok(Self { config, timezone, contacts, api_key, offline: false })
    }

    /// Disable the language model for this session
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn normalizer(&self) -> TemporalNormalizer {
        TemporalNormalizer::new(self.timezone)
    }

    /// The language model client, when enabled and an API key is configured
    pub fn language_model(&self) -> Result<Option<Box<dyn LanguageModel>>> {
        let settings = &self.config.language_model;
        if self.offline || !settings.enabled {
            info!("Language model disabled; using pattern parsing only");
            return Ok(None);
        }
        let Some(api_key) = self.api_key.clone() else {
            warn!("OPENAI_API_KEY is not set; using pattern parsing only");
            return Ok(None);
        };
        let client = OpenAiClient::new(
            api_key,
            &settings.base_url,
            &settings.model,
            settings.temperature,
            Duration::from_secs(settings.request_timeout_secs),
        )
        .context("Failed to build language model client")?;
        Ok(Some(Box::new(client)))
    }

    /// The calendar client, or `None` to simulate scheduling
    pub fn calendar(&self) -> Result<Option<Box<dyn CalendarCollaborator>>> {
        let settings = &self.config.calendar;
        let client = GoogleCalendarClient::from_files(
            &settings.token_path,
            &settings.credentials_path,
            &settings.api_base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
        .context("Failed to set up the calendar client")?;
        Ok(client.map(|c| Box::new(c) as Box<dyn CalendarCollaborator>))
    }

    pub fn cascade(&self) -> Result<ParseCascade> {
        let normalizer = self.normalizer();
        let semantic = SemanticParser::with_cache_size(
            self.language_model()?,
            normalizer,
            self.config.language_model.cache_size,
        );
        Ok(ParseCascade::new(
            semantic,
            PatternParser::new(normalizer),
            ContactResolver::new(self.contacts.clone()),
        )
        .with_default_duration(self.config.calendar.default_duration_minutes))
    }
}
