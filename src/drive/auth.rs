use std::path::Path;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::DriveError,
    management::{DEFAULT_EXPIRES_IN_SECS, DriveCredentials, GOOGLE_TOKEN_URI},
};

pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// One OAuth client entry of a Google `credentials.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

/// Reads a Google client secrets file, accepting both "installed" and "web"
/// application types.
pub async fn load_client_secret(path: &Path) -> Result<ClientSecret, DriveError> {
    let content = async_fs::read_to_string(path).await?;
    parse_client_secret(&content)
}

pub fn parse_client_secret(content: &str) -> Result<ClientSecret, DriveError> {
    let file: ClientSecretsFile = serde_json::from_str(content)?;
    file.installed.or(file.web).ok_or_else(|| {
        DriveError::Credentials("client secrets contain neither 'installed' nor 'web'".to_string())
    })
}

/// Builds the consent URL for the loopback flow.
///
/// Requests offline access so that a refresh token is issued.
pub fn authorize_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    code_challenge: &str,
    state: &str,
) -> Result<String, DriveError> {
    let mut url = Url::parse(&secret.auth_uri)
        .map_err(|e| DriveError::Credentials(format!("invalid auth_uri: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", &secret.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", DRIVE_FILE_SCOPE)
        .append_pair("state", state)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    Ok(url.to_string())
}

/// Exchanges the loopback authorization code for authorized-user credentials.
pub async fn exchange_code(
    http: &Client,
    secret: &ClientSecret,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> Result<DriveCredentials, DriveError> {
    let res = http
        .post(&secret.token_uri)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
        ])
        .send()
        .await?;

    let status = res.status();
    let json: Value = res.json().await?;
    let Some(access_token) = json["access_token"].as_str() else {
        return Err(DriveError::Credentials(format!(
            "token exchange failed ({status}): {}",
            json["error_description"]
                .as_str()
                .or_else(|| json["error"].as_str())
                .unwrap_or("no access token in response")
        )));
    };

    let mut credentials = DriveCredentials {
        token: Some(access_token.to_string()),
        refresh_token: json["refresh_token"].as_str().map(str::to_string),
        token_uri: secret.token_uri.clone(),
        client_id: secret.client_id.clone(),
        client_secret: secret.client_secret.clone(),
        scopes: vec![DRIVE_FILE_SCOPE.to_string()],
        expiry: None,
    };
    credentials.set_expires_in(json["expires_in"].as_i64().unwrap_or(DEFAULT_EXPIRES_IN_SECS));
    Ok(credentials)
}
