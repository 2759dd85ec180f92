#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use topsync::{
    config::SpotifyConfig,
    drive::{DriveClient, RemoteMirror},
    management::{DriveCredentials, DriveTokenManager},
    spotify::SpotifyClient,
};

pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

// ---------------------------------------------------------------------------
// Fake Spotify
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSpotify {
    /// Number of top artists available per time_range.
    pub artists: HashMap<String, usize>,
    /// Number of top tracks available per time_range.
    pub tracks: HashMap<String, usize>,
    /// Maximum items returned per page regardless of `limit`.
    pub page_cap: Option<usize>,
    /// 0-based track positions returned without artists.
    pub tracks_without_artists: Vec<usize>,
    /// Respond to track requests with 429.
    pub fail_tracks: bool,
    pub requests: Mutex<Vec<String>>,
}

impl FakeSpotify {
    pub fn with_counts(window: &str, artists: usize, tracks: usize) -> Self {
        let mut fake = FakeSpotify::default();
        fake.artists.insert(window.to_string(), artists);
        fake.tracks.insert(window.to_string(), tracks);
        fake
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn track_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with("tracks"))
            .collect()
    }

    fn page(&self, available: usize, params: &HashMap<String, String>) -> (usize, usize) {
        let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
        let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let mut count = limit.min(available.saturating_sub(offset));
        if let Some(cap) = self.page_cap {
            count = count.min(cap);
        }
        (offset, count)
    }
}

async fn top_artists(
    State(fake): State<Arc<FakeSpotify>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let window = params.get("time_range").cloned().unwrap_or_default();
    fake.requests.lock().unwrap().push(format!(
        "artists {} limit={} offset={}",
        window,
        params.get("limit").cloned().unwrap_or_default(),
        params.get("offset").cloned().unwrap_or_default()
    ));

    let available = fake.artists.get(&window).copied().unwrap_or(0);
    let (offset, count) = fake.page(available, &params);
    let items: Vec<Value> = (offset..offset + count)
        .map(|i| json!({ "id": format!("artist-{i}"), "name": format!("Artist {i}") }))
        .collect();

    Json(json!({ "items": items, "total": available }))
}

async fn top_tracks(
    State(fake): State<Arc<FakeSpotify>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let window = params.get("time_range").cloned().unwrap_or_default();
    fake.requests.lock().unwrap().push(format!(
        "tracks {} limit={} offset={}",
        window,
        params.get("limit").cloned().unwrap_or_default(),
        params.get("offset").cloned().unwrap_or_default()
    ));

    if fake.fail_tracks {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    let available = fake.tracks.get(&window).copied().unwrap_or(0);
    let (offset, count) = fake.page(available, &params);
    let items: Vec<Value> = (offset..offset + count)
        .map(|i| {
            let artists = if fake.tracks_without_artists.contains(&i) {
                json!([])
            } else {
                json!([
                    { "id": format!("by-{i}"), "name": format!("Singer {i}") },
                    { "id": "feat", "name": "Featured" }
                ])
            };
            json!({ "id": format!("track-{i}"), "name": format!("Track {i}"), "artists": artists })
        })
        .collect();

    Ok(Json(json!({ "items": items, "total": available })))
}

async fn me() -> Json<Value> {
    Json(json!({ "id": "alice_id", "display_name": "Alice Display" }))
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    match form.get("code").map(String::as_str) {
        Some("good-code") => Json(json!({
            "access_token": "spotify-token",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-top-read"
        }))
        .into_response(),
        Some("html-code") => (
            StatusCode::BAD_REQUEST,
            Html("<html><body><h1>400 Bad Request</h1></body></html>"),
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })),
        )
            .into_response(),
    }
}

pub fn spotify_router(fake: Arc<FakeSpotify>) -> Router {
    Router::new()
        .route("/v1/me", get(me))
        .route("/v1/me/top/artists", get(top_artists))
        .route("/v1/me/top/tracks", get(top_tracks))
        .route("/api/token", post(token))
        .with_state(fake)
}

pub fn spotify_config(addr: SocketAddr) -> SpotifyConfig {
    SpotifyConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "http://127.0.0.1:5000/callback".to_string(),
        auth_url: format!("http://{addr}/authorize"),
        token_url: format!("http://{addr}/api/token"),
        api_url: format!("http://{addr}/v1"),
        scope: "user-top-read".to_string(),
    }
}

pub async fn spawn_spotify(fake: FakeSpotify) -> (Arc<FakeSpotify>, SpotifyClient, SocketAddr) {
    let fake = Arc::new(fake);
    let addr = spawn(spotify_router(Arc::clone(&fake))).await;
    let client = SpotifyClient::new(spotify_config(addr), Duration::from_secs(5)).unwrap();
    (fake, client, addr)
}

// ---------------------------------------------------------------------------
// Fake Google Drive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: String,
    pub content: String,
}

#[derive(Default)]
pub struct FakeDrive {
    pub folders: Mutex<Vec<StoredFile>>,
    pub uploads: Mutex<Vec<StoredFile>>,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    /// Fail the first N upload calls with 500.
    pub failing_uploads: AtomicUsize,
    /// Answer every folder lookup and creation with 500.
    pub failing_folder_calls: AtomicBool,
    pub last_query: Mutex<Option<String>>,
}

impl FakeDrive {
    pub fn uploads(&self) -> Vec<StoredFile> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn folders(&self) -> Vec<StoredFile> {
        self.folders.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
            + self.create_calls.load(Ordering::SeqCst)
            + self.upload_calls.load(Ordering::SeqCst)
    }
}

/// Extracts the value of `name='...'` from a Drive query, undoing escapes.
fn quoted_after(query: &str, prefix: &str) -> Option<String> {
    let start = query.find(prefix)? + prefix.len();
    let mut out = String::new();
    let mut chars = query[start..].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '\'' => return Some(out),
            c => out.push(c),
        }
    }
    None
}

fn parent_in_query(query: &str) -> Option<String> {
    let end = query.find("' in parents")?;
    let start = query[..end].rfind('\'')? + 1;
    Some(query[start..end].to_string())
}

async fn list_files(
    State(fake): State<Arc<FakeDrive>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    fake.list_calls.fetch_add(1, Ordering::SeqCst);
    if fake.failing_folder_calls.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let query = params.get("q").cloned().unwrap_or_default();
    *fake.last_query.lock().unwrap() = Some(query.clone());

    let name = quoted_after(&query, "name='");
    let parent = parent_in_query(&query);
    let files: Vec<Value> = fake
        .folders
        .lock()
        .unwrap()
        .iter()
        .filter(|f| name.as_ref().is_none_or(|n| &f.name == n))
        .filter(|f| parent.as_ref().is_none_or(|p| f.parents.contains(p)))
        .map(|f| json!({ "id": f.id, "name": f.name, "parents": f.parents }))
        .collect();

    Ok(Json(json!({ "files": files })))
}

async fn create_folder(
    State(fake): State<Arc<FakeDrive>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let n = fake.create_calls.fetch_add(1, Ordering::SeqCst);
    if fake.failing_folder_calls.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let folder = StoredFile {
        id: format!("folder-{n}"),
        name: body["name"].as_str().unwrap_or_default().to_string(),
        parents: body["parents"]
            .as_array()
            .map(|p| p.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        mime_type: body["mimeType"].as_str().unwrap_or_default().to_string(),
        content: String::new(),
    };
    fake.folders.lock().unwrap().push(folder.clone());
    Ok(Json(json!({ "id": folder.id, "parents": folder.parents })))
}

async fn upload(
    State(fake): State<Arc<FakeDrive>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let n = fake.upload_calls.fetch_add(1, Ordering::SeqCst);
    let remaining = fake.failing_uploads.load(Ordering::SeqCst);
    if remaining > 0 {
        fake.failing_uploads.store(remaining - 1, Ordering::SeqCst);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_string();

    let body = String::from_utf8_lossy(&body).to_string();
    let parts: Vec<&str> = body
        .split(&format!("--{boundary}"))
        .filter(|p| !p.trim().is_empty() && p.trim() != "--")
        .collect();
    if parts.len() != 2 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let split_part = |part: &str| -> (String, String) {
        let (head, content) = part.split_once("\r\n\r\n").unwrap_or(("", ""));
        (
            head.trim().to_string(),
            content.strip_suffix("\r\n").unwrap_or(content).to_string(),
        )
    };
    let (_, metadata) = split_part(parts[0]);
    let (media_head, content) = split_part(parts[1]);
    let metadata: Value = serde_json::from_str(&metadata).map_err(|_| StatusCode::BAD_REQUEST)?;

    let file = StoredFile {
        id: format!("file-{n}"),
        name: metadata["name"].as_str().unwrap_or_default().to_string(),
        parents: metadata["parents"]
            .as_array()
            .map(|p| p.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        mime_type: media_head.trim_start_matches("Content-Type:").trim().to_string(),
        content,
    };
    fake.uploads.lock().unwrap().push(file.clone());
    Ok(Json(json!({ "id": file.id, "parents": file.parents })))
}

pub fn drive_router(fake: Arc<FakeDrive>) -> Router {
    Router::new()
        .route("/drive/v3/files", get(list_files).post(create_folder))
        .route("/upload/drive/v3/files", post(upload))
        .with_state(fake)
}

pub fn static_credentials() -> DriveCredentials {
    DriveCredentials {
        token: Some("drive-token".to_string()),
        refresh_token: None,
        token_uri: "http://127.0.0.1:1/token".to_string(),
        client_id: "drive-client".to_string(),
        client_secret: "drive-secret".to_string(),
        scopes: vec![],
        expiry: None,
    }
}

pub fn drive_client(addr: SocketAddr) -> DriveClient {
    DriveClient::new(
        format!("http://{addr}/drive/v3"),
        format!("http://{addr}/upload/drive/v3"),
        DriveTokenManager::new(static_credentials(), None),
        Duration::from_secs(5),
    )
    .unwrap()
}

pub async fn spawn_drive(parent: Option<&str>) -> (Arc<FakeDrive>, RemoteMirror) {
    let fake = Arc::new(FakeDrive::default());
    let addr = spawn(drive_router(Arc::clone(&fake))).await;
    let mirror = RemoteMirror::new(drive_client(addr), parent.map(str::to_string));
    (fake, mirror)
}
