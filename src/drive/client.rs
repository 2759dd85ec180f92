use std::{path::Path, time::Duration};

use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config::DriveConfig,
    error::DriveError,
    management::DriveTokenManager,
    types::{CreateFileRequest, DriveFile, DriveFileList},
    utils,
};

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Minimal Google Drive v3 client: folder lookup, folder creation and
/// multipart uploads.
///
/// The token manager sits behind a mutex so concurrent requests never refresh
/// the access token twice.
pub struct DriveClient {
    http: Client,
    api_url: String,
    upload_url: String,
    tokens: Mutex<DriveTokenManager>,
}

impl DriveClient {
    pub fn new(
        api_url: impl Into<String>,
        upload_url: impl Into<String>,
        tokens: DriveTokenManager,
        timeout: Duration,
    ) -> Result<Self, DriveError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            upload_url: upload_url.into(),
            tokens: Mutex::new(tokens),
        })
    }

    /// Builds a client from `GOOGLE_TOKEN`, falling back to the token file.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::Credentials`] when neither source is available.
    pub async fn from_config(config: &DriveConfig, timeout: Duration) -> Result<Self, DriveError> {
        let tokens = if let Some(blob) = &config.token_blob {
            DriveTokenManager::from_json(blob)?
        } else if config.token_file.is_file() {
            DriveTokenManager::load(&config.token_file).await?
        } else {
            return Err(DriveError::Credentials(
                "no GOOGLE_TOKEN set and no token file found".to_string(),
            ));
        };

        Self::new(&config.api_url, &config.upload_url, tokens, timeout)
    }

    async fn token(&self) -> Result<String, DriveError> {
        self.tokens.lock().await.get_valid_token(&self.http).await
    }

    /// Looks up a folder named exactly `name`, optionally restricted to the
    /// children of `parent`. Returns the first match.
    pub async fn find_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<Option<DriveFile>, DriveError> {
        let mut query = format!(
            "name='{name}' and mimeType='{FOLDER_MIME_TYPE}' and trashed=false",
            name = utils::escape_drive_query(name),
        );
        if let Some(parent) = parent {
            query.push_str(&format!(
                " and '{}' in parents",
                utils::escape_drive_query(parent)
            ));
        }

        let token = self.token().await?;
        let list = self
            .http
            .get(format!("{}/files", self.api_url))
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name, parents)"),
                ("pageSize", "5"),
                ("includeItemsFromAllDrives", "true"),
                ("supportsAllDrives", "true"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<DriveFileList>()
            .await?;

        Ok(list.files.into_iter().next())
    }

    pub async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<DriveFile, DriveError> {
        let body = CreateFileRequest {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: parent.into_iter().collect(),
        };

        let token = self.token().await?;
        let folder = self
            .http
            .post(format!("{}/files", self.api_url))
            .bearer_auth(token)
            .query(&[("fields", "id, parents"), ("supportsAllDrives", "true")])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<DriveFile>()
            .await?;

        Ok(folder)
    }

    /// Uploads `local_path` as `remote_name` with `parent` as its only parent.
    pub async fn upload_file(
        &self,
        local_path: &Path,
        remote_name: &str,
        parent: &str,
        mime_type: &str,
    ) -> Result<DriveFile, DriveError> {
        let content = async_fs::read(local_path).await?;
        let metadata = serde_json::to_vec(&CreateFileRequest {
            name: remote_name,
            mime_type: None,
            parents: vec![parent],
        })?;

        let boundary = format!("topsync-{}", utils::random_string(24));
        let body = multipart_related(&boundary, &metadata, mime_type, &content);

        let token = self.token().await?;
        let uploaded = self
            .http
            .post(format!("{}/files", self.upload_url))
            .bearer_auth(token)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id, parents"),
                ("supportsAllDrives", "true"),
            ])
            .header(
                "Content-Type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .json::<DriveFile>()
            .await?;

        Ok(uploaded)
    }

    /// Lists up to `page_size` files visible to the credentials.
    pub async fn list_files(&self, page_size: u32) -> Result<Vec<DriveFile>, DriveError> {
        let token = self.token().await?;
        let list = self
            .http
            .get(format!("{}/files", self.api_url))
            .bearer_auth(token)
            .query(&[
                ("pageSize", page_size.to_string().as_str()),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<DriveFileList>()
            .await?;

        Ok(list.files)
    }
}

fn multipart_related(boundary: &str, metadata: &[u8], mime_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + content.len() + 256);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(metadata);
    body.extend_from_slice(
        format!("\r\n--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
