//! Google Calendar REST client.

use super::token::{ClientSecret, StoredToken, TokenStore};
use super::{CalendarCollaborator, CalendarError};
use crate::composer::OutboundEvent;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Serialize)]
struct EventResource<'a> {
    summary: &'a str,
    start: EventDateTime,
    end: EventDateTime,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    date_time: String,
    time_zone: String,
}

impl<'a> From<&'a OutboundEvent> for EventResource<'a> {
    fn from(event: &'a OutboundEvent) -> Self {
        Self {
            summary: &event.title,
            start: EventDateTime {
                date_time: event.start.to_rfc3339(),
                time_zone: event.time_zone.clone(),
            },
            end: EventDateTime {
                date_time: event.end.to_rfc3339(),
                time_zone: event.time_zone.clone(),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEvent {
    html_link: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Creates events on the user's primary calendar
pub struct GoogleCalendarClient {
    http: Client,
    base_url: String,
    store: TokenStore,
    secret: Option<ClientSecret>,
    token: Mutex<StoredToken>,
}

impl GoogleCalendarClient {
    pub fn new(
        token: StoredToken,
        store: TokenStore,
        secret: Option<ClientSecret>,
        base_url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, CalendarError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            secret,
            token: Mutex::new(token),
        })
    }

    /// Build a client from the token and client-secrets files.
    ///
    /// Returns `Ok(None)` when no token has been stored yet, which puts the
    /// application in simulate mode. The client-secrets file is only needed to
    /// refresh an expired token, so a missing one is tolerated.
    pub fn from_files(
        token_path: &Path,
        credentials_path: &Path,
        base_url: &str,
        timeout: std::time::Duration,
    ) -> Result<Option<Self>, CalendarError> {
        let store = TokenStore::new(token_path);
        let Some(token) = store.load()? else {
            info!("No calendar token at {}; scheduling will be simulated", token_path.display());
            return Ok(None);
        };
        let secret = if credentials_path.exists() {
            Some(ClientSecret::load(credentials_path)?)
        } else {
            debug!("No client secrets at {}", credentials_path.display());
            None
        };
        Self::new(token, store, secret, base_url, timeout).map(Some)
    }

    async fn access_token(&self) -> Result<String, CalendarError> {
        let mut token = self.token.lock().await;
        if token.is_expired(Utc::now()) {
            let refreshed = self.refresh(&token).await?;
            self.store.save(&refreshed)?;
            *token = refreshed;
        }
        Ok(token.access_token.clone())
    }

    async fn refresh(&self, token: &StoredToken) -> Result<StoredToken, CalendarError> {
        let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
            CalendarError::Authorization("token expired and no refresh token is stored".to_string())
        })?;
        let secret = self.secret.as_ref().ok_or_else(|| {
            CalendarError::Authorization("token expired and no client secrets are available".to_string())
        })?;

        info!("Refreshing calendar access token");
        let response = self
            .http
            .post(&secret.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Authorization(format!(
                "token refresh failed with HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let refreshed: RefreshResponse = response.json().await?;
        Ok(StoredToken {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.or_else(|| token.refresh_token.clone()),
            expires_at: refreshed.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[async_trait]
impl CalendarCollaborator for GoogleCalendarClient {
    async fn create_event(&self, event: &OutboundEvent) -> Result<String, CalendarError> {
        let access_token = self.access_token().await?;
        let url = format!("{}/calendars/primary/events", self.base_url);
        debug!("Creating calendar event at {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&EventResource::from(event))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Authorization(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Api { status: status.as_u16(), body });
        }

        let created: CreatedEvent = response.json().await?;
        created
            .html_link
            .ok_or_else(|| CalendarError::InvalidResponse("response has no htmlLink".to_string()))
    }
}
