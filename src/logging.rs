//! Diagnostic logging to `log.txt`.
//!
//! Progress for the user goes to the console through the
//! [`ConsoleReporter`](crate::report::ConsoleReporter); everything logged with
//! `tracing` ends up in the log file instead.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tcg_config::LogLevel;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber, appending to `log_file` at `level`.
///
/// `RUST_LOG` overrides `level` when set. If the file can't be opened, logs go
/// to stderr instead and the reason is logged there.
pub fn init(log_file: &Path, level: LogLevel) {
    let filter = EnvFilter::builder().with_default_directive(LevelFilter::from(level).into()).from_env_lossy();
    let (writer, opened) = match open(log_file) {
        Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), Ok(())),
        Err(e) => (BoxMakeWriter::new(io::stderr), Err(e)),
    };
    let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_target(false).with_writer(writer);
    if tracing_subscriber::registry().with(filter).with(layer).try_init().is_err() {
        // Already installed (only happens when called twice).
        return;
    }
    if let Err(e) = opened {
        tracing::warn!(path = %log_file.display(), error = %e, "Unable to open log file, logging to stderr");
    }
}

fn open(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
