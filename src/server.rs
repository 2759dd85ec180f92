use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    Res, api,
    config::Config,
    drive::RemoteMirror,
    error::SpotifyError,
    info,
    management::SessionStore,
    spotify::SpotifyClient,
    types::PkceCode,
};

/// Everything the web handlers share. Cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub spotify: SpotifyClient,
    pub mirror: Arc<RemoteMirror>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, mirror: RemoteMirror) -> Result<Self, SpotifyError> {
        let spotify = SpotifyClient::new(config.spotify.clone(), config.http_timeout)?;
        let sessions = SessionStore::new(config.session_secret.clone());
        Ok(Self {
            config: Arc::new(config),
            spotify,
            mirror: Arc::new(mirror),
            sessions,
        })
    }

    /// Builds the state, including the Drive mirror, from configuration.
    pub async fn from_config(config: Config) -> Result<Self, SpotifyError> {
        let mirror = RemoteMirror::from_config(&config.drive, config.http_timeout).await;
        Self::new(config, mirror)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/login", post(api::login))
        .route("/callback", get(api::callback))
        .route("/summary", get(api::summary))
        .route("/health", get(api::health))
        .layer(Extension(state))
}

pub async fn start_api_server(config: Config) -> Res<()> {
    let addr = SocketAddr::from_str(&config.server_address)
        .map_err(|e| format!("Failed to parse server address: {}", e))?;

    let state = AppState::from_config(config).await?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Serves the loopback redirect target of the `drive-auth` flow.
pub async fn start_loopback_server(listener: TcpListener, state: Arc<Mutex<Option<PkceCode>>>) {
    let app = Router::new()
        .route("/", get(api::oauth_callback))
        .layer(Extension(state));

    if let Err(e) = axum::serve(listener, app).await {
        crate::warning!("Loopback server stopped: {}", e);
    }
}
