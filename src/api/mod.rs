//! # API Module
//!
//! HTTP handlers for the topsync web surface.
//!
//! ## Endpoints
//!
//! - [`index`] - `GET /`: landing page asking for the folder label
//! - [`login`] - `POST /login`: starts a fresh session and redirects to Spotify
//! - [`callback`] - `GET /callback`: exchanges the authorization code, runs the
//!   collection pipeline and redirects to the summary
//! - [`summary`] - `GET /summary`: top 10 artists and tracks for one window
//! - [`health`] - `GET /health`: status and version
//!
//! [`oauth_callback`] is not part of the web app; it serves the loopback
//! redirect of the `drive-auth` command.
//!
//! ## Failure Behavior
//!
//! A request without a usable session is redirected to `/`. Failed
//! authentication, failed Spotify reads and failed local writes are returned
//! as [`AppError`](crate::error::AppError) responses. Drive failures never
//! reach the user.

mod health;
mod login;
mod oauth;
mod pages;

pub use health::health;
pub use login::{CallbackParams, LoginForm, callback, login};
pub use oauth::oauth_callback;
pub use pages::{SUMMARY_LIMIT, SummaryParams, index, render_index, render_summary, summary};
