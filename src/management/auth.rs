use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DriveError;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Seconds before the recorded expiry at which a token is already refreshed.
const EXPIRY_BUFFER_SECS: i64 = 240;

/// Lifetime assumed when the token endpoint omits or garbles `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Google "authorized user" credentials, as stored in `token.json` or passed
/// through `GOOGLE_TOKEN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveCredentials {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339 timestamp of the access token expiry.
    #[serde(default)]
    pub expiry: Option<String>,
}

impl DriveCredentials {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry
            .as_deref()
            .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
            .map(|e| e.with_timezone(&Utc))
    }

    /// Records an expiry `expires_in` seconds from now. Out-of-range lifetimes
    /// fall back to [`DEFAULT_EXPIRES_IN_SECS`].
    pub fn set_expires_in(&mut self, expires_in: i64) {
        let now = Utc::now();
        let at = TimeDelta::try_seconds(expires_in)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now + TimeDelta::seconds(DEFAULT_EXPIRES_IN_SECS));
        self.expiry = Some(at.to_rfc3339_opts(SecondsFormat::Micros, true));
    }

    /// True when there is no access token or it expires within the buffer.
    ///
    /// A token without a recorded expiry is considered valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_none() {
            return true;
        }
        match self.expires_at() {
            Some(at) => at
                .checked_sub_signed(TimeDelta::seconds(EXPIRY_BUFFER_SECS))
                .is_none_or(|refresh_at| now >= refresh_at),
            None => false,
        }
    }
}

/// Keeps a Drive access token valid, refreshing and persisting it as needed.
pub struct DriveTokenManager {
    credentials: DriveCredentials,
    path: Option<PathBuf>,
}

impl DriveTokenManager {
    pub fn new(credentials: DriveCredentials, path: Option<PathBuf>) -> Self {
        DriveTokenManager { credentials, path }
    }

    /// Parses credentials passed inline; refreshed tokens are kept in memory only.
    pub fn from_json(blob: &str) -> Result<Self, DriveError> {
        let credentials: DriveCredentials = serde_json::from_str(blob)?;
        Ok(Self::new(credentials, None))
    }

    pub async fn load(path: &Path) -> Result<Self, DriveError> {
        let content = async_fs::read_to_string(path).await?;
        let credentials: DriveCredentials = serde_json::from_str(&content)?;
        Ok(Self::new(credentials, Some(path.to_path_buf())))
    }

    pub async fn persist(&self) -> Result<(), DriveError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.credentials)?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    /// Returns an access token, refreshing it first when it is about to expire.
    ///
    /// # Errors
    ///
    /// Fails when the token is expired and cannot be refreshed.
    pub async fn get_valid_token(&mut self, http: &Client) -> Result<String, DriveError> {
        if self.is_expired() {
            self.credentials = self.refresh_token(http).await?;
            if let Err(e) = self.persist().await {
                crate::warning!("Failed to save refreshed drive token: {}", e);
            }
        }

        self.credentials
            .token
            .clone()
            .ok_or_else(|| DriveError::Credentials("no access token".to_string()))
    }

    pub fn is_expired(&self) -> bool {
        self.credentials.is_expired_at(Utc::now())
    }

    async fn refresh_token(&self, http: &Client) -> Result<DriveCredentials, DriveError> {
        let refresh_token = self.credentials.refresh_token.as_deref().ok_or_else(|| {
            DriveError::Credentials("token expired and no refresh token available".to_string())
        })?;

        let res = http
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let json: Value = res.json().await?;
        let Some(access_token) = json["access_token"].as_str() else {
            return Err(DriveError::Credentials(format!(
                "token refresh failed ({status}): {}",
                json["error_description"]
                    .as_str()
                    .or_else(|| json["error"].as_str())
                    .unwrap_or("no access token in response")
            )));
        };

        let mut credentials = self.credentials.clone();
        credentials.token = Some(access_token.to_string());
        credentials.set_expires_in(json["expires_in"].as_i64().unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        if let Some(rotated) = json["refresh_token"].as_str() {
            credentials.refresh_token = Some(rotated.to_string());
        }
        Ok(credentials)
    }

    pub fn current(&self) -> &DriveCredentials {
        &self.credentials
    }
}
