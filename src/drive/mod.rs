//! # Google Drive Module
//!
//! Everything needed to mirror exported tables into Google Drive.
//!
//! - [`client`] - REST calls against Drive v3 (folder lookup, folder creation,
//!   multipart upload, file listing)
//! - [`mirror`] - The optional mirror used by the collection pipeline. It owns
//!   an `Option<DriveClient>` and turns every call into a no-op when Drive is
//!   not configured.
//! - [`auth`] - One-off installed-application OAuth flow used by the
//!   `drive-auth` command to produce `token.json`
//!
//! Access tokens are kept fresh by
//! [`DriveTokenManager`](crate::management::DriveTokenManager); refreshed tokens
//! loaded from a file are written back to that file.

pub mod auth;
pub mod client;
pub mod mirror;

pub use client::DriveClient;
pub use mirror::RemoteMirror;
