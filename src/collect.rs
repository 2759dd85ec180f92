//! The collection pipeline: fetch, export and mirror for every time window.

use std::path::{Path, PathBuf};

use crate::{
    drive::RemoteMirror,
    error::{CollectError, DriveError},
    export, info,
    spotify::SpotifyClient,
    success,
    types::{ExportTable, FolderHandle, RemoteFileId, TimeWindow, UserIdentity},
    utils, warning,
};

/// Number of top artists exported per window.
pub const EXPORT_ARTIST_LIMIT: usize = 20;
/// Number of top tracks exported per window.
pub const EXPORT_TRACK_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    pub artist_limit: usize,
    pub track_limit: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            artist_limit: EXPORT_ARTIST_LIMIT,
            track_limit: EXPORT_TRACK_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindowReport {
    pub window: TimeWindow,
    pub artists: usize,
    pub tracks: usize,
    pub files: Vec<PathBuf>,
    pub uploads: Vec<RemoteFileId>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    pub windows: Vec<WindowReport>,
}

impl CollectionReport {
    pub fn window(&self, window: TimeWindow) -> Option<&WindowReport> {
        self.windows.iter().find(|w| w.window == window)
    }
}

/// Runs fetch → export → mirror for each window in turn.
pub struct Collector<'a> {
    spotify: &'a SpotifyClient,
    mirror: &'a RemoteMirror,
    data_dir: &'a Path,
    options: CollectOptions,
}

/// Folder state for one run: resolved at most once, on the first upload.
enum FolderState {
    Unresolved,
    Resolved(FolderHandle),
    Failed,
}

impl<'a> Collector<'a> {
    pub fn new(spotify: &'a SpotifyClient, mirror: &'a RemoteMirror, data_dir: &'a Path) -> Self {
        Self {
            spotify,
            mirror,
            data_dir,
            options: CollectOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CollectOptions) -> Self {
        self.options = options;
        self
    }

    /// Directory holding the tables of `display_name` for `window`.
    pub fn window_dir(&self, display_name: &str, window: TimeWindow) -> PathBuf {
        self.data_dir
            .join(utils::sanitize_path_component(display_name))
            .join(window.as_str())
    }

    /// Collects all three windows for the user owning `token`.
    ///
    /// # Errors
    ///
    /// A Spotify read failure or a local write failure aborts the run. Drive
    /// failures are logged and never abort it.
    pub async fn collect_all(
        &self,
        token: &str,
        identity: &UserIdentity,
    ) -> Result<CollectionReport, CollectError> {
        let mut folder = FolderState::Unresolved;
        let mut report = CollectionReport::default();

        for window in TimeWindow::ALL {
            info!("Collecting data: {}", window);
            let window_report = self
                .collect_window(token, identity, window, &mut folder)
                .await?;
            report.windows.push(window_report);
        }

        Ok(report)
    }

    async fn collect_window(
        &self,
        token: &str,
        identity: &UserIdentity,
        window: TimeWindow,
        folder: &mut FolderState,
    ) -> Result<WindowReport, CollectError> {
        let mut report = WindowReport {
            window,
            artists: 0,
            tracks: 0,
            files: Vec::new(),
            uploads: Vec::new(),
        };

        let artists = self
            .spotify
            .fetch_top_artists(token, window, self.options.artist_limit)
            .await?;
        report.artists = artists.len();
        self.export_and_mirror(ExportTable::artists(artists), identity, window, folder, &mut report)
            .await?;

        let tracks = self
            .spotify
            .fetch_top_tracks(token, window, self.options.track_limit)
            .await?;
        report.tracks = tracks.len();
        self.export_and_mirror(ExportTable::tracks(tracks), identity, window, folder, &mut report)
            .await?;

        Ok(report)
    }

    /// Writes a non-empty table and mirrors it. Empty tables produce no file.
    async fn export_and_mirror(
        &self,
        table: ExportTable,
        identity: &UserIdentity,
        window: TimeWindow,
        folder: &mut FolderState,
        report: &mut WindowReport,
    ) -> Result<(), CollectError> {
        if table.is_empty() {
            return Ok(());
        }

        let path = self
            .window_dir(&identity.display_name, window)
            .join(table.kind.file_name());
        let rows = export::export_table(&table, &path).await?;
        success!("Saved {} rows -> {}", rows, path.display());
        report.files.push(path.clone());

        let remote_name = format!(
            "{}_{}_{}.csv",
            identity.display_name,
            window,
            table.kind.as_str()
        );
        if let Some(id) = self
            .mirror_file(folder, &identity.label, &path, &remote_name)
            .await
        {
            report.uploads.push(id);
        }
        Ok(())
    }

    /// Uploads one file, swallowing and logging any Drive failure.
    async fn mirror_file(
        &self,
        folder: &mut FolderState,
        label: &str,
        path: &Path,
        remote_name: &str,
    ) -> Option<RemoteFileId> {
        if !self.mirror.is_enabled() {
            return None;
        }

        if let FolderState::Unresolved = folder {
            *folder = match self.mirror.resolve_or_create_folder(label).await {
                Ok(handle) => FolderState::Resolved(handle),
                Err(e) => {
                    warning!("Could not resolve drive folder {}: {}", label, e);
                    FolderState::Failed
                }
            };
        }

        let result = match folder {
            FolderState::Resolved(handle) => {
                self.mirror.upload_file(path, remote_name, handle).await
            }
            _ => Err(DriveError::MissingParent(remote_name.to_string())),
        };

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                warning!("Upload failed for {}: {}", remote_name, e);
                None
            }
        }
    }
}
