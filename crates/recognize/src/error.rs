//! Recognition Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Every variant is terminal for the image being identified: the caller logs
//! it and leaves the file where it is for manual review.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A recognition error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for recognition operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The image file could not be read from disk.
    #[display("unable to read image: {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// The HTTP client could not be constructed.
    #[display("unable to build HTTP client")]
    Client,
    /// The request never produced a response (connection failure, timeout).
    #[display("recognition request failed")]
    Request,
    /// The service answered with a non-success status code.
    #[display("recognition service responded with status {_0}")]
    Status(#[error(not(source))] u16),
    /// The response (or the JSON embedded in it) could not be understood.
    #[display("malformed recognition reply")]
    MalformedReply,
    /// The embedded JSON was missing a required field, or it was blank.
    #[display("recognition reply is missing field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in this crate actually retries; this is informational for
    /// whoever reads the log.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}
