//! Discovery of `Errors` folders and the card images inside them.
//!
//! The expected layout is `<base>/<game>/<set>/Errors/...`. Both lists are
//! collected up front so that moving files does not disturb the walk.

use std::path::{Path, PathBuf};
use tcg_recognize::is_card_image;
use walkdir::WalkDir;

/// Name of the folder holding images that could not be identified earlier.
pub const ERRORS_DIR: &str = "Errors";

/// Returns every `<base>/<game>/<set>/Errors` directory, sorted by path.
///
/// Only the set level is considered: an `Errors` folder directly under a game
/// or deeper than a set is ignored. Unreadable directories are logged and
/// skipped.
pub fn errors_folders(base: &Path) -> Vec<PathBuf> {
    WalkDir::new(base)
        .min_depth(2)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                None
            },
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.path().join(ERRORS_DIR))
        .filter(|errors| errors.is_dir())
        .collect()
}

/// Returns every card image below `folder`, recursively, sorted by path.
///
/// Symlinks are followed, so a linked image is picked up like any other file.
pub fn images(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                None
            },
        })
        .filter(|entry| entry.file_type().is_file() && is_card_image(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}
