//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise only this crate logs, at info.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::default_data_dir;

const DEFAULT_FILTER: &str = "handwave=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr. Used by the one-shot subcommands.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Append logs to `<data dir>/handwave.log` so they do not tear the TUI.
///
/// Returns the log path, or `None` when no log file could be opened, in
/// which case logging stays off.
pub fn init_file() -> Option<PathBuf> {
    let dir = default_data_dir()?;
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("handwave.log");
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .ok()?;
    Some(path)
}
