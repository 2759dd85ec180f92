//! Error types.
//!
//! Each concern has its own error enum. [`AppError`] is what the web handlers
//! return; it wraps the others and decides the HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::warning;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("spotify request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("spotify authorization failed: {0}")]
    Auth(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("drive request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("drive credentials unavailable: {0}")]
    Credentials(String),
    #[error("invalid drive response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("drive io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload of {0} requested without a parent folder")]
    MissingParent(String),
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Spotify(#[from] SpotifyError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error(transparent)]
    Spotify(SpotifyError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<SpotifyError> for AppError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Auth(msg) => AppError::Auth(msg),
            other => AppError::Spotify(other),
        }
    }
}

impl From<CollectError> for AppError {
    fn from(err: CollectError) -> Self {
        match err {
            CollectError::Spotify(e) => e.into(),
            CollectError::Export(e) => AppError::Export(e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Spotify(_) => StatusCode::BAD_GATEWAY,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        warning!("{} {}", status, self);
        (status, self.to_string()).into_response()
    }
}
