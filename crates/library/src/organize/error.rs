//! Error types for the [`organize`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An organize error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for organize operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an organize failure.
///
/// All of these are filesystem problems; recognition failures are not errors
/// at this level; they produce an [`Outcome::Unidentified`](super::Outcome::Unidentified).
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A file name or directory that cannot be used as a move target.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The destination directory could not be created.
    #[display("unable to create directory: {}", _0.display())]
    CreateDirectory(#[error(not(source))] PathBuf),
    /// Checking whether a candidate destination is free failed (not simply "not found").
    #[display("unable to inspect: {}", _0.display())]
    Probe(#[error(not(source))] PathBuf),
    /// The rename (or copy-then-delete fallback) failed.
    #[display("unable to move {} to {}", from.display(), to.display())]
    Move { from: PathBuf, to: PathBuf },
    /// An emptied `Errors` folder could not be inspected or removed.
    #[display("unable to clean up: {}", _0.display())]
    Cleanup(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Probe(_) | Self::Move { .. } | Self::Cleanup(_))
    }
}
