//! # CLI Module
//!
//! Command implementations behind the `topsync` binary.
//!
//! - [`serve`] - Runs the web app: login, Spotify callback, collection
//!   pipeline and summary page
//! - [`drive_auth`] - One-time Google Drive authorization producing the
//!   `token.json` the mirror reads at startup
//!
//! Commands report progress with the crate's logging macros and exit the
//! process through `error!` on unrecoverable failures.
//!
//! ## Usage Patterns
//!
//! ```bash
//! topsync drive-auth                     # Authorize Drive once
//! topsync serve                          # Start the web app
//! topsync serve --address 0.0.0.0:8080   # Bind elsewhere
//! ```

mod drive_auth;
mod serve;

pub use drive_auth::drive_auth;
pub use serve::serve;
