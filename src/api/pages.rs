use axum::{
    Extension,
    extract::Query,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    error::AppError,
    management::cookie_from_headers,
    server::AppState,
    types::{RankedItem, TimeWindow},
    utils::html_escape,
};

/// Number of artists and tracks shown on the summary page.
pub const SUMMARY_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub time_range: Option<String>,
}

pub async fn index() -> Html<String> {
    Html(render_index())
}

/// Shows the top artists and tracks of the logged-in user for one window.
pub async fn summary(
    Extension(app): Extension<AppState>,
    headers: HeaderMap,
    Query(params): Query<SummaryParams>,
) -> Result<Response, AppError> {
    let session = match cookie_from_headers(&headers) {
        Some(cookie) => app.sessions.get(&cookie).await,
        None => None,
    };
    let Some(session) = session else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(token) = session.valid_token() else {
        return Ok(Redirect::to("/").into_response());
    };

    let window = match params.time_range.as_deref() {
        Some(raw) => raw.parse::<TimeWindow>().map_err(AppError::BadRequest)?,
        None => TimeWindow::default(),
    };

    let artists = app
        .spotify
        .fetch_top_artists(token, window, SUMMARY_LIMIT)
        .await?;
    let tracks = app
        .spotify
        .fetch_top_tracks(token, window, SUMMARY_LIMIT)
        .await?;

    Ok(Html(render_summary(session.display_name(), window, &artists, &tracks)).into_response())
}

pub fn render_index() -> String {
    page(
        "topsync",
        r#"<h1>Your Spotify top artists and tracks</h1>
<form method="post" action="/login">
  <label for="custom_name">Folder name</label>
  <input id="custom_name" name="custom_name" type="text" placeholder="Your name" required>
  <button type="submit">Log in with Spotify</button>
</form>"#,
    )
}

pub fn render_summary(
    display_name: &str,
    window: TimeWindow,
    artists: &[RankedItem],
    tracks: &[RankedItem],
) -> String {
    let mut body = format!("<h1>Top items for {}</h1>\n<nav>", html_escape(display_name));
    for w in TimeWindow::ALL {
        if w == window {
            body.push_str(&format!(" <strong>{}</strong>", w.label()));
        } else {
            body.push_str(&format!(
                r#" <a href="/summary?time_range={}">{}</a>"#,
                w.as_str(),
                w.label()
            ));
        }
    }
    body.push_str("</nav>\n<h2>Artists</h2>\n<ol>");
    for a in artists {
        body.push_str(&format!("<li>{}</li>", html_escape(&a.name)));
    }
    body.push_str("</ol>\n<h2>Tracks</h2>\n<ol>");
    for t in tracks {
        body.push_str(&format!(
            "<li>{} <small>{}</small></li>",
            html_escape(&t.name),
            html_escape(t.primary_artist.as_deref().unwrap_or_default())
        ));
    }
    body.push_str("</ol>");

    page("topsync - summary", &body)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{body}\n</body></html>\n"
    )
}
