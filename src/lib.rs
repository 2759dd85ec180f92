//! Spotify Top Items Collector Library
//!
//! This library collects a user's top artists and tracks from the Spotify Web API
//! across the three supported time windows, writes them as CSV tables and
//! optionally mirrors the tables into a per-user Google Drive folder. A small
//! web surface drives the login flow and renders a summary page.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the login flow and summary pages
//! - `cli` - Command-line interface implementations
//! - `collect` - The fetch, export and mirror pipeline
//! - `config` - Configuration management and environment variables
//! - `drive` - Google Drive client, credentials and remote mirror
//! - `error` - Error types shared across the crate
//! - `export` - CSV table writer
//! - `management` - Session and Drive token management
//! - `server` - HTTP server and router setup
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use topsync::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> topsync::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod collect;
pub mod config;
pub mod drive;
pub mod error;
pub mod export;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the CLI commands, where any error simply ends the command. Library
/// components return their own typed errors from [`error`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Collecting data: {}", window);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Saved {} rows -> {}", rows, path.display());
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for unrecoverable startup failures. Request handlers must never
/// call this, they return an [`error::AppError`] instead.
///
/// # Example
///
/// ```
/// error!("Invalid configuration: {}", e);
/// // Program exits here
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning to stderr with a yellow exclamation mark.
///
/// Used for recoverable problems such as a failed Drive upload or a rejected
/// request.
///
/// # Example
///
/// ```
/// warning!("Upload failed for {}: {}", name, e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
