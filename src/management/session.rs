use std::{collections::HashMap, sync::Arc};

use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac, digest::KeyInit};
use sha2::Sha256;
use tokio::sync::Mutex;

use crate::{types::UserIdentity, utils};

pub const SESSION_COOKIE: &str = "topsync_session";
pub const DEFAULT_LABEL: &str = "Unknown_User";
pub const DEFAULT_SPOTIFY_ID: &str = "UnknownSpotifyUser";
/// Sessions older than this are dropped whether or not they hold a token.
pub const SESSION_MAX_AGE_SECS: i64 = 24 * 60 * 60;

type HmacSha256 = Hmac<Sha256>;

/// Everything the web flow remembers about one browser.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub label: String,
    pub oauth_state: Option<String>,
    pub spotify_token: Option<String>,
    pub expires_in: Option<u64>,
    pub obtained_at: Option<i64>,
    pub spotify_id: Option<String>,
    pub display_name: Option<String>,
}

impl SessionData {
    pub fn with_label(label: Option<&str>) -> Self {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LABEL);
        Self {
            label: label.to_string(),
            oauth_state: Some(utils::random_string(32)),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.spotify_id.as_deref())
            .unwrap_or("Unknown User")
    }

    /// Identity of the logged-in user, once the callback has completed.
    pub fn identity(&self) -> Option<UserIdentity> {
        let spotify_id = self.spotify_id.clone()?;
        Some(UserIdentity {
            display_name: self.display_name.clone().unwrap_or_else(|| spotify_id.clone()),
            spotify_id,
            label: self.label.clone(),
        })
    }

    /// True when the stored access token is past its lifetime.
    ///
    /// Sessions without a recorded lifetime never expire here; Spotify will
    /// reject the token instead. A lifetime that overflows the clock counts as
    /// expired.
    pub fn is_token_expired(&self, now: i64) -> bool {
        match (self.obtained_at, self.expires_in) {
            (Some(at), Some(secs)) => i64::try_from(secs)
                .ok()
                .and_then(|secs| at.checked_add(secs))
                .is_none_or(|end| now >= end),
            _ => false,
        }
    }

    pub fn valid_token(&self) -> Option<&str> {
        if self.is_token_expired(Utc::now().timestamp()) {
            return None;
        }
        self.spotify_token.as_deref()
    }
}

struct StoredSession {
    created_at: i64,
    data: SessionData,
}

impl StoredSession {
    fn is_stale(&self, now: i64) -> bool {
        now.saturating_sub(self.created_at) >= SESSION_MAX_AGE_SECS
            || self.data.is_token_expired(now)
    }
}

/// In-memory session store keyed by signed cookie values.
///
/// The cookie value is `id.sig` where `sig` is the base64url HMAC-SHA256 of
/// the id under the session secret. Entries older than
/// [`SESSION_MAX_AGE_SECS`] or holding an expired token are dropped on the
/// next `create`, and on `get` of that entry.
///
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct SessionStore {
    mac: Arc<HmacSha256>,
    sessions: Arc<Mutex<HashMap<String, StoredSession>>>,
}

impl SessionStore {
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        // HMAC accepts keys of any length
        let mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .unwrap_or_else(|_| <HmacSha256 as KeyInit>::new(&Default::default()));
        Self {
            mac: Arc::new(mac),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Stores `data` under a fresh id and returns the signed cookie value.
    pub async fn create(&self, data: SessionData) -> String {
        let id = utils::random_string(32);
        let now = Utc::now().timestamp();

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, s| !s.is_stale(now));
        sessions.insert(
            id.clone(),
            StoredSession {
                created_at: now,
                data,
            },
        );
        format!("{id}.{sig}", sig = self.sign(&id))
    }

    /// Returns the session behind `cookie`, removing it if it has gone stale.
    pub async fn get(&self, cookie: &str) -> Option<SessionData> {
        let id = self.verify(cookie)?;
        let now = Utc::now().timestamp();

        let mut sessions = self.sessions.lock().await;
        if sessions.get(id)?.is_stale(now) {
            sessions.remove(id);
            return None;
        }
        sessions.get(id).map(|s| s.data.clone())
    }

    /// Applies `f` to the session behind `cookie`. Returns false if there is none.
    pub async fn update<F>(&self, cookie: &str, f: F) -> bool
    where
        F: FnOnce(&mut SessionData),
    {
        let Some(id) = self.verify(cookie) else {
            return false;
        };
        match self.sessions.lock().await.get_mut(id) {
            Some(stored) => {
                f(&mut stored.data);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, cookie: &str) {
        if let Some(id) = self.verify(cookie) {
            self.sessions.lock().await.remove(id);
        }
    }

    /// Drops every stale session as of `now`. Returns how many were removed.
    pub async fn prune_expired(&self, now: i64) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_stale(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub fn sign(&self, id: &str) -> String {
        let mut mac = HmacSha256::clone(&self.mac);
        mac.update(id.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn verify<'a>(&self, cookie: &'a str) -> Option<&'a str> {
        let (id, sig) = cookie.split_once('.')?;
        let sig = URL_SAFE_NO_PAD.decode(sig).ok()?;

        let mut mac = HmacSha256::clone(&self.mac);
        mac.update(id.as_bytes());
        // constant-time comparison
        mac.verify_slice(&sig).ok().map(|_| id)
    }
}

/// Extracts the session cookie value from request headers.
pub fn cookie_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie_header(value: &str) -> String {
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax")
}
