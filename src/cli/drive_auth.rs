use std::{
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tabled::Table;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    Res,
    config::{DEFAULT_DRIVE_API_URL, DEFAULT_DRIVE_UPLOAD_URL},
    drive::{self, DriveClient},
    error, info,
    management::{DriveCredentials, DriveTokenManager},
    server::start_loopback_server,
    success,
    types::{DriveFileTableRow, PkceCode},
    utils, warning,
};

/// How long to wait for the browser to hit the loopback callback.
const AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Makes sure `token_path` holds usable Drive credentials, then lists a few
/// files to prove they work.
///
/// An existing token is reused, refreshing it when it has expired. Otherwise
/// the installed-application flow is run with the client secrets from
/// `credentials_path`.
pub async fn drive_auth(credentials_path: &Path, token_path: &Path) {
    let http = Client::new();

    let mut manager = match DriveTokenManager::load(token_path).await {
        Ok(mut m) => match m.get_valid_token(&http).await {
            Ok(_) => {
                info!("Using existing token from {}", token_path.display());
                Some(m)
            }
            Err(e) => {
                warning!("Stored token is not usable: {}", e);
                None
            }
        },
        Err(_) => None,
    };

    if manager.is_none() {
        let credentials = match authorize(credentials_path, &http).await {
            Ok(c) => c,
            Err(e) => error!("Authorization failed: {}", e),
        };
        let m = DriveTokenManager::new(credentials, Some(token_path.to_path_buf()));
        if let Err(e) = m.persist().await {
            error!("Failed to save token to {}: {}", token_path.display(), e);
        }
        success!("Saved token to {}", token_path.display());
        manager = Some(m);
    }

    let Some(manager) = manager else {
        error!("No usable drive credentials.");
    };

    let client = match DriveClient::new(
        DEFAULT_DRIVE_API_URL,
        DEFAULT_DRIVE_UPLOAD_URL,
        manager,
        Duration::from_secs(30),
    ) {
        Ok(c) => c,
        Err(e) => error!("Failed to build drive client: {}", e),
    };

    match client.list_files(10).await {
        Ok(files) if files.is_empty() => info!("No files found."),
        Ok(files) => {
            let rows: Vec<DriveFileTableRow> = files
                .into_iter()
                .map(|f| DriveFileTableRow {
                    name: f.name.unwrap_or_default(),
                    id: f.id,
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        Err(e) => warning!("Listing files failed: {}", e),
    }
}

async fn authorize(credentials_path: &Path, http: &Client) -> Res<DriveCredentials> {
    let secret = drive::auth::load_client_secret(credentials_path)
        .await
        .map_err(|e| format!("cannot read {}: {}", credentials_path.display(), e))?;

    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let state = utils::random_string(32);

    // start loopback server on an ephemeral port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let redirect_uri = format!("http://{}/", listener.local_addr()?);

    let shared_state = Arc::new(Mutex::new(Some(PkceCode {
        code_verifier: code_verifier.clone(),
        state: state.clone(),
        code: None,
    })));
    let server_state = Arc::clone(&shared_state);
    let server = tokio::spawn(async move {
        start_loopback_server(listener, server_state).await;
    });

    let auth_url = drive::auth::authorize_url(&secret, &redirect_uri, &code_challenge, &state)?;
    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let outcome = wait_for_code(shared_state).await;
    server.abort();

    let code = match outcome {
        Some(Ok(code)) => code,
        Some(Err(reason)) => return Err(reason.into()),
        None => return Err("authorization timed out".into()),
    };

    let credentials =
        drive::auth::exchange_code(http, &secret, &code, &code_verifier, &redirect_uri).await?;
    Ok(credentials)
}

async fn wait_for_code(
    shared_state: Arc<Mutex<Option<PkceCode>>>,
) -> Option<Result<String, String>> {
    let pb = ProgressBar::new_spinner();
    pb.set_message("Waiting for authorization...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let start = Instant::now();
    while start.elapsed() < AUTH_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(outcome) = lock.as_ref().and_then(|p| p.code.clone()) {
            pb.finish_and_clear();
            return Some(outcome);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    pb.finish_and_clear();
    None
}
