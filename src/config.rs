use crate::calendar::DEFAULT_API_BASE_URL;
use crate::env_manager::{self, GOOGLE_CREDENTIALS_JSON, GOOGLE_TOKEN_PATH, TIMEZONE};
use crate::meeting::DEFAULT_DURATION_MINUTES;
use crate::parser::semantic::api::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_TIMEZONE: &str = "US/Pacific";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub language_model: LanguageModelConfig,
    /// Nickname to canonical name; keys are matched case-insensitively
    #[serde(default = "default_contacts")]
    pub contacts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub token_path: PathBuf,
    pub credentials_path: PathBuf,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub default_duration_minutes: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
            credentials_path: PathBuf::from("credentials.json"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 10,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageModelConfig {
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub cache_size: usize,
}

impl Default for LanguageModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.2,
            request_timeout_secs: 10,
            cache_size: 100,
        }
    }
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_contacts() -> BTreeMap<String, String> {
    [
        ("john", "Johnathan Smith"),
        ("sarah", "Sarah Kapoor"),
        ("raj", "Raj Mehta"),
        ("viv", "Vivek Singh"),
        ("amy", "Amelia Zhang"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            calendar: CalendarConfig::default(),
            language_model: LanguageModelConfig::default(),
            contacts: default_contacts(),
        }
    }
}

impl Config {
    /// Load from the per-user config directory, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply `TIMEZONE`, `GOOGLE_TOKEN_PATH` and `GOOGLE_CREDENTIALS_JSON` from the environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(env_manager::get_env_var);
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timezone) = lookup(TIMEZONE) {
            self.timezone = timezone;
        }
        if let Some(path) = lookup(GOOGLE_TOKEN_PATH) {
            self.calendar.token_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(GOOGLE_CREDENTIALS_JSON) {
            self.calendar.credentials_path = PathBuf::from(path);
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn validate(&self) -> Result<()> {
        self.timezone()?;
        Url::parse(&self.calendar.api_base_url).context("Invalid calendar.api_base_url")?;
        Url::parse(&self.language_model.base_url).context("Invalid language_model.base_url")?;
        if self.calendar.default_duration_minutes == 0 {
            return Err(anyhow!("calendar.default_duration_minutes must be positive"));
        }
        Ok(())
    }
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "meetsched", "meetsched")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.timezone, "US/Pacific");
        assert_eq!(config.calendar.default_duration_minutes, 30);
        assert_eq!(config.contacts.get("amy").map(String::as_str), Some("Amelia Zhang"));
        assert_eq!(config.language_model.model, "gpt-4o-mini");
        config.validate().unwrap();
    }

    #[test]
    fn test_config_save_load() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("meetsched").join("config.toml");

        let mut config = Config::default();
        config.timezone = "Europe/London".to_string();
        config.contacts.insert("bo".to_string(), "Bo Lin".to_string());
        config.save_to(&config_path)?;

        assert_eq!(Config::load_from(&config_path)?, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "timezone = \"Asia/Kolkata\"\n[calendar]\ndefault_duration_minutes = 45\n")?;

        let config = Config::load_from(&config_path)?;
        assert_eq!(config.timezone()?, chrono_tz::Asia::Kolkata);
        assert_eq!(config.calendar.default_duration_minutes, 45);
        assert_eq!(config.calendar.token_path, PathBuf::from("token.json"));
        assert_eq!(config.contacts.len(), 5);
        Ok(())
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TIMEZONE", "America/New_York"),
            ("GOOGLE_TOKEN_PATH", "/tmp/tok.json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.calendar.token_path, PathBuf::from("/tmp/tok.json"));
        assert_eq!(config.calendar.credentials_path, PathBuf::from("credentials.json"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.calendar.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
