//! Process-wide log setup: stdout plus an optional append-only log file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;
use crate::error::{ServerError, ServerResult};

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// A plain-text (no ANSI colours) layer writing to `file`.
pub fn file_layer<S>(file: File) -> fmt::Layer<S, DefaultFields, Format, Mutex<File>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer().with_ansi(false).with_writer(Mutex::new(file))
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.level`; `verbose` raises the default to
/// `debug`. A log file that cannot be opened is reported and skipped.
pub fn init_logging(config: &LogConfig, verbose: bool) -> ServerResult<()> {
    let default_level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| ServerError::Logging(e.to_string()))?;

    let mut file_error = None;
    let file = config.file_path().and_then(|path| match open_log_file(path) {
        Ok(file) => Some(file),
        Err(e) => {
            file_error = Some((path.to_path_buf(), e));
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file.map(file_layer))
        .try_init()
        .map_err(|e| ServerError::Logging(e.to_string()))?;

    if let Some((path, e)) = file_error {
        tracing::warn!(path = %path.display(), "cannot open log file, logging to stdout only: {e}");
    }
    Ok(())
}
