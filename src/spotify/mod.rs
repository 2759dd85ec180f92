//! # Spotify Integration Module
//!
//! This module is the integration layer between topsync and the Spotify Web API.
//! It covers the authorization code exchange of the web login flow and the
//! read-only "top items" endpoints the collection pipeline is built on.
//!
//! ## Architecture
//!
//! ```text
//! Web Layer (api handlers) / Collection Pipeline
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization code, client secret)
//!     └── Top Items (artists, paginated tracks)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! ### Authentication Module
//!
//! [`auth`] - Builds the authorize redirect, exchanges the callback code for an
//! access token (bounded by a 10 second timeout) and loads the user profile.
//!
//! ### Top Items Module
//!
//! [`top`] - Retrieves ranked artists with a single call and ranked tracks by
//! paging through `/me/top/tracks` until the requested total is reached or the
//! provider runs out of items.
//!
//! ## Credentials
//!
//! The client never stores an access token. Every call receives the bearer
//! token of the current session explicitly, so one client instance is shared by
//! all sessions.
//!
//! ## Error Handling
//!
//! Reads are not retried. A failed request surfaces as
//! [`SpotifyError::Http`](crate::error::SpotifyError) and aborts whatever
//! collection step issued it. A rejected code exchange surfaces as
//! [`SpotifyError::Auth`](crate::error::SpotifyError).
//!
//! ## API Coverage
//!
//! - `POST {accounts}/api/token` - Authorization code exchange
//! - `GET /me` - Current user profile
//! - `GET /me/top/artists` - Top artists for a time range
//! - `GET /me/top/tracks` - Top tracks for a time range, with offset paging

use std::time::Duration;

use reqwest::Client;

use crate::{config::SpotifyConfig, error::SpotifyError};

pub mod auth;
pub mod top;

/// Shared Spotify Web API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    config: SpotifyConfig,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig, timeout: Duration) -> Result<Self, SpotifyError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    fn http(&self) -> &Client {
        &self.http
    }

    fn api_url(&self) -> &str {
        &self.config.api_url
    }
}
