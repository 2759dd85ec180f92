use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::{
    error::SpotifyError,
    types::{SpotifyToken, UserProfile},
};

use super::SpotifyClient;

/// Timeout applied to the authorization code exchange.
pub const TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

impl SpotifyClient {
    /// Builds the URL the user is redirected to in order to grant access.
    ///
    /// `state` is echoed back on the callback and checked against the session.
    pub fn authorize_url(&self, state: &str) -> Result<String, SpotifyError> {
        let cfg = self.config();
        let mut url = Url::parse(&cfg.auth_url)
            .map_err(|e| SpotifyError::Auth(format!("invalid authorize url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &cfg.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &cfg.redirect_uri)
            .append_pair("scope", &cfg.scope)
            .append_pair("state", state);
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// Uses the client secret with HTTP basic auth. The request is bounded by
    /// [`TOKEN_EXCHANGE_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// A rejected exchange (non-success status or a response without an access
    /// token) is returned as [`SpotifyError::Auth`]; transport failures as
    /// [`SpotifyError::Http`].
    pub async fn exchange_code(&self, code: &str) -> Result<SpotifyToken, SpotifyError> {
        let cfg = self.config();
        let basic = STANDARD.encode(format!("{}:{}", cfg.client_id, cfg.client_secret));

        let res = self
            .http()
            .post(&cfg.token_url)
            .header("Authorization", format!("Basic {basic}"))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", cfg.redirect_uri.as_str()),
            ])
            .timeout(TOKEN_EXCHANGE_TIMEOUT)
            .send()
            .await?;

        let status = res.status();
        if status != StatusCode::OK {
            // error bodies are not guaranteed to be JSON
            let body = res.text().await.unwrap_or_default();
            let json: Value = serde_json::from_str(&body).unwrap_or_default();
            let reason = json["error_description"]
                .as_str()
                .or_else(|| json["error"].as_str())
                .unwrap_or("token exchange rejected");
            return Err(SpotifyError::Auth(format!("{status}: {reason}")));
        }

        let body = res.bytes().await?;
        serde_json::from_slice::<SpotifyToken>(&body)
            .map_err(|e| SpotifyError::Auth(format!("malformed token response: {e}")))
    }

    /// Fetches the profile of the user owning `token`.
    pub async fn fetch_current_user(&self, token: &str) -> Result<UserProfile, SpotifyError> {
        let api_url = format!("{uri}/me", uri = self.api_url());
        let profile = self
            .http()
            .get(&api_url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json::<UserProfile>()
            .await?;

        Ok(profile)
    }
}
