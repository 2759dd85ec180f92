use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

pub async fn health(Extension(app): Extension<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "mirror": if app.mirror.is_enabled() { "enabled" } else { "disabled" },
    }))
}
