use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::PkceCode;

/// Loopback redirect target of the `drive-auth` flow.
///
/// Only records the outcome; the code is exchanged by the waiting command.
pub async fn oauth_callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PkceCode>>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pkce) = state.as_mut() else {
        return Html("<h4>No authorization in progress.</h4>");
    };

    if let Some(error) = params.get("error") {
        pkce.code = Some(Err(error.clone()));
        return Html("<h4>Authorization denied.</h4>");
    }

    let Some(code) = params.get("code") else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    if params.get("state") != Some(&pkce.state) {
        pkce.code = Some(Err("state mismatch".to_string()));
        return Html("<h4>State mismatch. Please try again.</h4>");
    }

    pkce.code = Some(Ok(code.clone()));
    Html("<h2>Authentication successful.</h2><p>Close browser window.</p>")
}
