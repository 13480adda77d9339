//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configuration file exists but could not be read.
    #[display("unable to read configuration file: {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// One or more values could not be deserialized into [`Config`](crate::Config).
    #[display("invalid configuration")]
    Invalid,
    /// No `openai_api_key` was provided by any configuration source.
    #[display("no API key found; please ensure your OpenAI API key is listed in tcg.cfg")]
    MissingApiKey,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration is loaded exactly once; the user has to fix the file.
        false
    }
}
