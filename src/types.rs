use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One of the three lookback periods Spotify computes top items for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [
        TimeWindow::ShortTerm,
        TimeWindow::MediumTerm,
        TimeWindow::LongTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::ShortTerm => "short_term",
            TimeWindow::MediumTerm => "medium_term",
            TimeWindow::LongTerm => "long_term",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::ShortTerm => "Last 4 weeks",
            TimeWindow::MediumTerm => "Last 6 months",
            TimeWindow::LongTerm => "All time",
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::MediumTerm
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(TimeWindow::ShortTerm),
            "medium_term" => Ok(TimeWindow::MediumTerm),
            "long_term" => Ok(TimeWindow::LongTerm),
            other => Err(format!(
                "invalid time range '{other}', expected short_term, medium_term or long_term"
            )),
        }
    }
}

/// An artist or track at a given position of a top list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedItem {
    pub rank: usize,
    pub id: String,
    pub name: String,
    /// First listed artist of a track; `None` for artists.
    pub primary_artist: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Artists,
    Tracks,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Artists => "artists",
            TableKind::Tracks => "tracks",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

/// Ranked items sharing one column schema, in rank order.
#[derive(Debug, Clone)]
pub struct ExportTable {
    pub kind: TableKind,
    pub items: Vec<RankedItem>,
}

impl ExportTable {
    pub fn artists(items: Vec<RankedItem>) -> Self {
        Self {
            kind: TableKind::Artists,
            items,
        }
    }

    pub fn tracks(items: Vec<RankedItem>) -> Self {
        Self {
            kind: TableKind::Tracks,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct ArtistRow<'a> {
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Artist")]
    pub artist: &'a str,
    #[serde(rename = "ID")]
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct TrackRow<'a> {
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Track")]
    pub track: &'a str,
    #[serde(rename = "Artist")]
    pub artist: &'a str,
    #[serde(rename = "ID")]
    pub id: &'a str,
}

/// Who a collection run belongs to.
///
/// `label` is chosen by the user before logging in and names the Drive folder;
/// the Spotify fields are known only after the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub spotify_id: String,
    pub display_name: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

/// Opaque Drive folder id; empty when the mirror is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FolderHandle(pub String);

impl FolderHandle {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque Drive file id; empty when the mirror is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RemoteFileId(pub String);

impl RemoteFileId {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Serialize)]
pub struct CreateFileRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<&'a str>,
}

#[derive(Tabled)]
pub struct DriveFileTableRow {
    pub name: String,
    pub id: String,
}

/// State shared between the `drive-auth` command and its loopback callback.
#[derive(Debug, Clone)]
pub struct PkceCode {
    pub code_verifier: String,
    pub state: String,
    pub code: Option<Result<String, String>>,
}
