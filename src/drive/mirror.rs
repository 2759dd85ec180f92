use std::{path::Path, time::Duration};

use crate::{
    config::DriveConfig,
    error::DriveError,
    info,
    types::{FolderHandle, RemoteFileId},
    warning,
};

use super::DriveClient;

pub const CSV_MIME_TYPE: &str = "text/csv";

/// Optional copy of exported tables in Google Drive.
///
/// When no client is configured every operation is a no-op returning an empty
/// handle, so the pipeline runs unchanged in local-only mode.
pub struct RemoteMirror {
    client: Option<DriveClient>,
    parent_id: Option<String>,
}

impl RemoteMirror {
    pub fn disabled() -> Self {
        Self {
            client: None,
            parent_id: None,
        }
    }

    pub fn new(client: DriveClient, parent_id: Option<String>) -> Self {
        Self {
            client: Some(client),
            parent_id,
        }
    }

    /// Builds the mirror from configuration.
    ///
    /// A disabled mirror stays disabled. An enabled mirror whose credentials
    /// cannot be loaded is disabled with a warning instead of failing startup.
    pub async fn from_config(config: &DriveConfig, timeout: Duration) -> Self {
        if !config.enabled {
            info!("Drive mirror disabled by configuration.");
            return Self::disabled();
        }

        match DriveClient::from_config(config, timeout).await {
            Ok(client) => {
                info!("Drive mirror enabled.");
                Self::new(client, config.parent_folder_id.clone())
            }
            Err(e) => {
                warning!("Drive mirror unavailable, keeping files local only: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&DriveClient> {
        self.client.as_ref()
    }

    /// Returns the folder named `name` under the configured parent, creating it
    /// when missing.
    ///
    /// Lookup and creation are two separate calls; two concurrent runs for the
    /// same name can both end up creating a folder.
    pub async fn resolve_or_create_folder(&self, name: &str) -> Result<FolderHandle, DriveError> {
        let Some(client) = &self.client else {
            return Ok(FolderHandle::empty());
        };
        let parent = self.parent_id.as_deref();

        if let Some(folder) = client.find_folder(name, parent).await? {
            info!("Found folder {}: {}", name, folder.id);
            return Ok(FolderHandle(folder.id));
        }

        let folder = client.create_folder(name, parent).await?;
        info!("Created folder {}: {}", name, folder.id);
        Ok(FolderHandle(folder.id))
    }

    /// Uploads a local file into `folder` as CSV.
    ///
    /// # Errors
    ///
    /// Uploading to an empty folder handle while the mirror is enabled is a
    /// [`DriveError::MissingParent`].
    pub async fn upload_file(
        &self,
        local_path: &Path,
        remote_name: &str,
        folder: &FolderHandle,
    ) -> Result<RemoteFileId, DriveError> {
        let Some(client) = &self.client else {
            return Ok(RemoteFileId::empty());
        };
        if folder.is_empty() {
            return Err(DriveError::MissingParent(remote_name.to_string()));
        }

        let uploaded = client
            .upload_file(local_path, remote_name, folder.as_str(), CSV_MIME_TYPE)
            .await?;
        info!(
            "Uploaded {} -> requested parent {}, got parents {:?}",
            remote_name,
            folder.as_str(),
            uploaded.parents
        );
        Ok(RemoteFileId(uploaded.id))
    }
}
