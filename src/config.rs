//! Configuration management for the Spotify Top Items Collector.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. All settings are read once at startup into a
//! [`Config`] value which is then passed explicitly to the components that need it.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the current working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5000/callback";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";
pub const DEFAULT_SESSION_SECRET: &str = "dev_secret_key";
pub const SPOTIFY_SCOPE: &str = "user-top-read";

/// Loads environment variables from `.env` files.
///
/// Looks for a `.env` in the current working directory first and then in the
/// platform-specific local data directory under `topsync/.env`. Variables that
/// are already set in the process environment are never overridden, and a
/// missing file is not an error.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/topsync/.env`
/// - macOS: `~/Library/Application Support/topsync/.env`
/// - Windows: `%LOCALAPPDATA%/topsync/.env`
///
/// # Errors
///
/// Returns an error string if the local data directory cannot be created.
pub async fn load_env() -> Result<(), String> {
    let _ = dotenv::dotenv();

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("topsync/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Spotify application credentials and endpoints.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scope: String,
}

/// Google Drive mirror settings.
///
/// `enabled` is the explicit switch for the mirror. When it is on but no
/// credential material can be loaded the server still starts, with the mirror
/// disabled.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub enabled: bool,
    pub parent_folder_id: Option<String>,
    /// Authorized-user JSON passed directly through `GOOGLE_TOKEN`.
    pub token_blob: Option<String>,
    pub token_file: PathBuf,
    pub api_url: String,
    pub upload_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub session_secret: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub spotify: SpotifyConfig,
    pub drive: DriveConfig,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `SPOTIFY_CLIENT_ID` or `SPOTIFY_CLIENT_SECRET` is missing, or
    /// when a numeric or boolean setting cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let spotify = SpotifyConfig {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: or("SPOTIFY_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            auth_url: or("SPOTIFY_AUTH_URL", DEFAULT_SPOTIFY_AUTH_URL),
            token_url: or("SPOTIFY_TOKEN_URL", DEFAULT_SPOTIFY_TOKEN_URL),
            api_url: trim_slash(or("SPOTIFY_API_URL", DEFAULT_SPOTIFY_API_URL)),
            scope: SPOTIFY_SCOPE.to_string(),
        };

        let drive = DriveConfig {
            enabled: parse_or("MIRROR_ENABLED", get("MIRROR_ENABLED"), true)?,
            parent_folder_id: get("GOOGLE_DRIVE_FOLDER_ID"),
            token_blob: get("GOOGLE_TOKEN"),
            token_file: PathBuf::from(or("GOOGLE_TOKEN_FILE", "token.json")),
            api_url: trim_slash(or("GOOGLE_DRIVE_API_URL", DEFAULT_DRIVE_API_URL)),
            upload_url: trim_slash(or("GOOGLE_DRIVE_UPLOAD_URL", DEFAULT_DRIVE_UPLOAD_URL)),
        };

        let timeout_secs: u64 = parse_or("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), 30)?;

        Ok(Self {
            server_address: or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            session_secret: or("SESSION_SECRET_KEY", DEFAULT_SESSION_SECRET),
            data_dir: PathBuf::from(or("DATA_DIR", "data")),
            http_timeout: Duration::from_secs(timeout_secs),
            spotify,
            drive,
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
