//! Build script for topsync.
//!
//! Places the `.env.example` template in `{data_local_dir}/topsync/`, the second
//! location `config::load_env` reads a `.env` from, so a fresh install has a
//! template to copy next to it.
//!
//! - Linux: `~/.local/share/topsync/.env.example`
//! - macOS: `~/Library/Application Support/topsync/.env.example`
//! - Windows: `%LOCALAPPDATA%/topsync/.env.example`

use std::{env, fs, path::PathBuf};

const TEMPLATE: &str = ".env.example";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={TEMPLATE}");

    let template = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join(TEMPLATE);
    if !template.is_file() {
        println!("cargo:warning={TEMPLATE} missing at {}", template.display());
        return Ok(());
    }

    let target_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("topsync");
    fs::create_dir_all(&target_dir)?;
    fs::copy(&template, target_dir.join(TEMPLATE))?;

    Ok(())
}
