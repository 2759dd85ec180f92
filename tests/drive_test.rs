mod common;

use std::{collections::HashMap, path::Path, sync::atomic::Ordering};

use axum::{Form, Json, Router, routing::post};
use chrono::{Duration, SecondsFormat, Utc};
use common::{spawn, spawn_drive, static_credentials};
use serde_json::{Value, json};
use tempfile::TempDir;
use topsync::{
    drive::{
        RemoteMirror,
        auth::{DRIVE_FILE_SCOPE, authorize_url, parse_client_secret},
    },
    error::DriveError,
    management::{DEFAULT_EXPIRES_IN_SECS, DriveCredentials, DriveTokenManager},
    types::FolderHandle,
};

fn expiry_in(secs: i64) -> Option<String> {
    Some((Utc::now() + Duration::seconds(secs)).to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[test]
fn test_credentials_expiry_rules() {
    let now = Utc::now();

    let mut creds = static_credentials();
    assert!(!creds.is_expired_at(now), "no expiry means valid");

    creds.expiry = expiry_in(3600);
    assert!(!creds.is_expired_at(now));

    creds.expiry = expiry_in(120);
    assert!(creds.is_expired_at(now), "inside the refresh buffer");

    creds.expiry = expiry_in(-10);
    assert!(creds.is_expired_at(now));

    creds.expiry = expiry_in(3600);
    creds.token = None;
    assert!(creds.is_expired_at(now), "missing token is expired");
}

#[test]
fn test_credentials_out_of_range_lifetime_uses_default() {
    let mut creds = static_credentials();
    let before = Utc::now();

    creds.set_expires_in(i64::MAX);
    let at = creds.expires_at().unwrap();
    assert!(at > before);
    assert!(at <= Utc::now() + Duration::seconds(DEFAULT_EXPIRES_IN_SECS));
    assert!(at >= before + Duration::seconds(DEFAULT_EXPIRES_IN_SECS - 5));

    creds.set_expires_in(i64::MIN);
    assert!(creds.expires_at().unwrap() > before);
    assert!(!creds.is_expired_at(Utc::now()));
}

#[test]
fn test_credentials_parse_authorized_user_json() {
    let blob = r#"{
        "token": "ya29.abc",
        "refresh_token": "1//refresh",
        "client_id": "cid.apps.googleusercontent.com",
        "client_secret": "csecret",
        "scopes": ["https://www.googleapis.com/auth/drive.file"],
        "expiry": "2030-01-01T00:00:00Z"
    }"#;

    let manager = DriveTokenManager::from_json(blob).unwrap();
    let creds = manager.current();
    assert_eq!(creds.token.as_deref(), Some("ya29.abc"));
    assert_eq!(creds.token_uri, "https://oauth2.googleapis.com/token");
    assert_eq!(creds.expires_at().unwrap().to_rfc3339(), "2030-01-01T00:00:00+00:00");
    assert!(!manager.is_expired());

    assert!(matches!(
        DriveTokenManager::from_json("{not json"),
        Err(DriveError::Json(_))
    ));
}

async fn token_endpoint(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    if form.get("grant_type").map(String::as_str) == Some("refresh_token")
        && form.get("refresh_token").map(String::as_str) == Some("1//refresh")
    {
        Json(json!({ "access_token": "fresh-token", "expires_in": 3599 }))
    } else {
        Json(json!({ "error": "invalid_grant" }))
    }
}

#[tokio::test]
async fn test_token_manager_refreshes_and_persists() {
    let addr = spawn(Router::new().route("/token", post(token_endpoint))).await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");

    let creds = DriveCredentials {
        token: Some("stale".to_string()),
        refresh_token: Some("1//refresh".to_string()),
        token_uri: format!("http://{addr}/token"),
        expiry: expiry_in(-60),
        ..static_credentials()
    };
    std::fs::write(&path, serde_json::to_string(&creds).unwrap()).unwrap();

    let mut manager = DriveTokenManager::load(&path).await.unwrap();
    assert!(manager.is_expired());

    let token = manager.get_valid_token(&reqwest::Client::new()).await.unwrap();
    assert_eq!(token, "fresh-token");
    assert!(!manager.is_expired());

    let saved: DriveCredentials =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved.token.as_deref(), Some("fresh-token"));
    assert_eq!(saved.refresh_token.as_deref(), Some("1//refresh"));
    assert!(saved.expires_at().unwrap() > Utc::now());
}

#[tokio::test]
async fn test_token_manager_refresh_failure() {
    let addr = spawn(Router::new().route("/token", post(token_endpoint))).await;

    let mut manager = DriveTokenManager::new(
        DriveCredentials {
            token: None,
            refresh_token: Some("revoked".to_string()),
            token_uri: format!("http://{addr}/token"),
            ..static_credentials()
        },
        None,
    );
    let result = manager.get_valid_token(&reqwest::Client::new()).await;
    assert!(matches!(result, Err(DriveError::Credentials(msg)) if msg.contains("invalid_grant")));

    let mut no_refresh = DriveTokenManager::new(
        DriveCredentials {
            token: None,
            ..static_credentials()
        },
        None,
    );
    assert!(matches!(
        no_refresh.get_valid_token(&reqwest::Client::new()).await,
        Err(DriveError::Credentials(_))
    ));
}

#[test]
fn test_parse_client_secret_variants() {
    let installed_json = r#"{"installed":{
        "client_id":"cid","client_secret":"cs","redirect_uris":["http://localhost"]
    }}"#;
    let installed = parse_client_secret(installed_json).unwrap();
    assert_eq!(installed.client_id, "cid");
    assert_eq!(installed.auth_uri, "https://accounts.google.com/o/oauth2/auth");

    let web = parse_client_secret(
        r#"{"web":{"client_id":"wid","client_secret":"ws","token_uri":"http://t/token"}}"#,
    )
    .unwrap();
    assert_eq!(web.client_id, "wid");
    assert_eq!(web.token_uri, "http://t/token");

    assert!(matches!(
        parse_client_secret(r#"{"other":{}}"#),
        Err(DriveError::Credentials(_))
    ));
}

#[test]
fn test_drive_authorize_url() {
    let secret = parse_client_secret(r#"{"installed":{"client_id":"cid","client_secret":"cs"}}"#)
        .unwrap();
    let url = authorize_url(&secret, "http://127.0.0.1:4321/", "challenge", "st").unwrap();
    let params: HashMap<String, String> = reqwest::Url::parse(&url)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect();

    assert_eq!(params["client_id"], "cid");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:4321/");
    assert_eq!(params["scope"], DRIVE_FILE_SCOPE);
    assert_eq!(params["code_challenge"], "challenge");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["access_type"], "offline");
    assert_eq!(params["state"], "st");
}

#[tokio::test]
async fn test_disabled_mirror_is_a_no_op() {
    let mirror = RemoteMirror::disabled();
    assert!(!mirror.is_enabled());

    let folder = mirror.resolve_or_create_folder("Alice").await.unwrap();
    assert!(folder.is_empty());

    let id = mirror
        .upload_file(Path::new("/does/not/exist.csv"), "x.csv", &folder)
        .await
        .unwrap();
    assert!(id.is_empty());
}

#[tokio::test]
async fn test_resolve_or_create_folder_is_idempotent() {
    let (drive, mirror) = spawn_drive(Some("root-folder")).await;

    let first = mirror.resolve_or_create_folder("Alice").await.unwrap();
    let second = mirror.resolve_or_create_folder("Alice").await.unwrap();
    let other = mirror.resolve_or_create_folder("Bob").await.unwrap();

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(drive.create_calls.load(Ordering::SeqCst), 2);
    assert_eq!(drive.folders().len(), 2);
}

#[tokio::test]
async fn test_resolve_folder_escapes_quotes() {
    let (drive, mirror) = spawn_drive(None).await;

    let first = mirror.resolve_or_create_folder("O'Brien").await.unwrap();
    let second = mirror.resolve_or_create_folder("O'Brien").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(drive.folders()[0].name, "O'Brien");
    let query = drive.last_query.lock().unwrap().clone().unwrap();
    assert!(query.contains("name='O\\'Brien'"));
    assert!(!query.contains("in parents"));
}

#[tokio::test]
async fn test_upload_requires_folder_when_enabled() {
    let (drive, mirror) = spawn_drive(None).await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("artists.csv");
    std::fs::write(&path, "Rank,Artist,ID\n").unwrap();

    let result = mirror
        .upload_file(&path, "artists.csv", &FolderHandle::empty())
        .await;

    assert!(matches!(result, Err(DriveError::MissingParent(_))));
    assert_eq!(drive.total_calls(), 0);
}

#[tokio::test]
async fn test_upload_file_sends_metadata_and_content() {
    let (drive, mirror) = spawn_drive(None).await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracks.csv");
    std::fs::write(&path, "Rank,Track,Artist,ID\n1,Song,Lead,t1\n").unwrap();

    let folder = mirror.resolve_or_create_folder("Alice").await.unwrap();
    let id = mirror
        .upload_file(&path, "Alice_short_term_tracks.csv", &folder)
        .await
        .unwrap();

    assert!(!id.is_empty());
    let uploads = drive.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].name, "Alice_short_term_tracks.csv");
    assert_eq!(uploads[0].parents, vec![folder.as_str().to_string()]);
    assert_eq!(uploads[0].mime_type, "text/csv");
    assert_eq!(uploads[0].content, "Rank,Track,Artist,ID\n1,Song,Lead,t1\n");
}

#[tokio::test]
async fn test_list_files() {
    let (_drive, mirror) = spawn_drive(None).await;
    mirror.resolve_or_create_folder("Alice").await.unwrap();

    let files = mirror.client().unwrap().list_files(10).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name.as_deref(), Some("Alice"));
}
