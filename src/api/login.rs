use axum::{
    Extension, Form,
    extract::Query,
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    collect::Collector,
    error::AppError,
    management::{DEFAULT_SPOTIFY_ID, SessionData, cookie_from_headers, session_cookie_header},
    server::AppState,
    success,
    types::UserIdentity,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub custom_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Starts a fresh session for the submitted label and redirects to Spotify.
pub async fn login(
    Extension(app): Extension<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Some(previous) = cookie_from_headers(&headers) {
        app.sessions.remove(&previous).await;
    }

    let session = SessionData::with_label(form.custom_name.as_deref());
    let auth_url = app
        .spotify
        .authorize_url(session.oauth_state.as_deref().unwrap_or_default())?;
    let cookie = app.sessions.create(session).await;

    Ok((
        [(header::SET_COOKIE, session_cookie_header(&cookie))],
        Redirect::to(&auth_url),
    )
        .into_response())
}

/// Spotify redirect target.
///
/// Exchanges the code, records the user in the session and runs the
/// collection pipeline before sending the user to the summary page.
pub async fn callback(
    Extension(app): Extension<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    if let Some(error) = params.error {
        return Err(AppError::Auth(format!("spotify denied access: {error}")));
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(cookie) = cookie_from_headers(&headers) else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(session) = app.sessions.get(&cookie).await else {
        return Ok(Redirect::to("/").into_response());
    };

    if session.oauth_state.is_none() || session.oauth_state != params.state {
        return Err(AppError::Auth("state mismatch".to_string()));
    }

    let token = app.spotify.exchange_code(&code).await?;
    let profile = app.spotify.fetch_current_user(&token.access_token).await?;

    let spotify_id = profile
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SPOTIFY_ID.to_string());
    let display_name = profile
        .display_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| spotify_id.clone());
    success!("Logged in as: {} | {}", spotify_id, display_name);

    let identity = UserIdentity {
        spotify_id: spotify_id.clone(),
        display_name: display_name.clone(),
        label: session.label.clone(),
    };

    let access_token = token.access_token.clone();
    app.sessions
        .update(&cookie, move |s| {
            s.oauth_state = None;
            s.spotify_token = Some(token.access_token);
            s.expires_in = token.expires_in;
            s.obtained_at = Some(Utc::now().timestamp());
            s.spotify_id = Some(spotify_id);
            s.display_name = Some(display_name);
        })
        .await;

    Collector::new(&app.spotify, &app.mirror, &app.config.data_dir)
        .collect_all(&access_token, &identity)
        .await?;

    Ok(Redirect::to("/summary").into_response())
}
