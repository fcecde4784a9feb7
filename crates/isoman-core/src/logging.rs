//! Tracing setup.
//!
//! A run logs to `$XDG_STATE_HOME/iso-manager/iso-manager.log`. When that
//! file cannot be opened, only warnings reach stderr so the trust prompt and
//! progress lines stay readable. `RUST_LOG` overrides either filter.

use anyhow::Result;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::APP_NAME;

pub const DEFAULT_FILTER: &str = "info,isoman_core=debug,iso_manager=debug";
const STDERR_FILTER: &str = "warn";

/// Where log records end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// `~/.local/state/iso-manager/iso-manager.log`, creating the directory.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME)?;
    Ok(xdg_dirs.place_state_file(format!("{APP_NAME}.log"))?)
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::OpenOptions::new().create(true).append(true).open(path)
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn install<W>(writer: W, default: &str)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    // A subscriber installed earlier (tests, embedding) wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_or(default))
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

/// Install the global subscriber and report where it writes.
pub fn init() -> LogSink {
    let opened = log_file_path().and_then(|path| Ok((open_append(&path)?, path)));
    match opened {
        Ok((file, path)) => {
            install(Mutex::new(file), DEFAULT_FILTER);
            tracing::info!(pid = std::process::id(), "iso-manager {} started", env!("CARGO_PKG_VERSION"));
            LogSink::File(path)
        }
        Err(err) => {
            install(io::stderr, STDERR_FILTER);
            tracing::warn!("log file unavailable, logging to stderr: {:#}", err);
            LogSink::Stderr
        }
    }
}
