//! OAuth token storage for the Google Calendar client.
//
// The token file is JSON written by this crate; the client-secrets file is the
// `credentials.json` downloaded from the Google Cloud console.

use super::CalendarError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// Refresh slightly ahead of the real expiry so a request never races it
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now + Duration::seconds(EXPIRY_MARGIN_SECS))
    }
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// OAuth client registration used to refresh access tokens
#[derive(Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Load an "installed" or "web" client registration
    pub fn load(path: &Path) -> Result<Self, CalendarError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CalendarError::TokenStorage(format!("failed to read {}: {}", path.display(), e))
        })?;
        let file: ClientSecretsFile = serde_json::from_str(&content).map_err(|e| {
            CalendarError::TokenStorage(format!("failed to parse {}: {}", path.display(), e))
        })?;
        file.installed.or(file.web).ok_or_else(|| {
            CalendarError::TokenStorage(format!("{} has no client registration", path.display()))
        })
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// File-backed token persistence
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored token, or `None` when no token file exists
    pub fn load(&self) -> Result<Option<StoredToken>, CalendarError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            CalendarError::TokenStorage(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map(Some).map_err(|e| {
            CalendarError::TokenStorage(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    pub fn save(&self, token: &StoredToken) -> Result<(), CalendarError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CalendarError::TokenStorage(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(token)
            .map_err(|e| CalendarError::TokenStorage(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| {
            CalendarError::TokenStorage(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}
