use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::organize::conflict::relocate;
use crate::organize::error::{ErrorKind as OrganizeErrorKind, Result as OrganizeResult};
use crate::sanitize::sanitize_filename;
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use tcg_recognize::{Recognizer, identify_file};
use tracing::instrument;

/// One image found inside an `Errors` folder, waiting to be identified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageTask {
    /// Full path to the image.
    pub path: PathBuf,
    /// The `Errors` folder the image was discovered under (possibly several
    /// levels up).
    pub errors_dir: PathBuf,
    /// Root of the batch; reported paths are relative to this.
    pub base: PathBuf,
}

impl ImageTask {
    pub fn new(path: impl Into<PathBuf>, errors_dir: impl Into<PathBuf>, base: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), errors_dir: errors_dir.into(), base: base.into() }
    }

    /// `path` relative to `base`, or unchanged when it isn't below it.
    pub fn relative(&self) -> PathBuf {
        relative_to(&self.path, &self.base)
    }

    /// The set folder identified images are moved into.
    pub fn destination_dir(&self) -> OrganizeResult<&Path> {
        self.errors_dir.parent().ok_or_raise(|| OrganizeErrorKind::InvalidPath(self.errors_dir.clone()))
    }
}

pub(crate) fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}

/// The outcome of (successfully) handling a single image.
///
/// Paths are absolute, as found on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The card was identified and the file now lives in the set folder.
    Renamed { from: PathBuf, to: PathBuf },
    /// The file already had the name it would have been given.
    Unchanged(PathBuf),
    /// Recognition failed, or produced a name with no usable characters. The
    /// file was left where it was.
    Unidentified(PathBuf),
}

/// Identifies a single image and moves it out of its `Errors` folder.
///
/// The card name is sanitized, the original extension is kept, and the file is
/// moved into the parent of the `Errors` folder with [`relocate`] so that an
/// existing card of the same name is never overwritten.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Organize>`](LibraryErrorKind::Organize)
/// when the file was identified but could not be moved. Recognition failures
/// are not errors; they produce [`Outcome::Unidentified`].
pub fn organize_image<R: Recognizer + ?Sized>(task: &ImageTask, recognizer: &R) -> LibraryResult<Outcome> {
    organize_image_inner(task, recognizer).or_raise(|| LibraryErrorKind::Organize)
}

#[instrument(skip_all, fields(path = %task.path.display()))]
pub(crate) fn organize_image_inner<R: Recognizer + ?Sized>(task: &ImageTask, recognizer: &R) -> OrganizeResult<Outcome> {
    // identify_file() has already logged why.
    let Ok(identification) = identify_file(recognizer, &task.path) else {
        return Ok(Outcome::Unidentified(task.path.clone()));
    };

    let stem = sanitize_filename(&identification.card_name);
    if stem.is_empty() {
        tracing::error!(
            card_name = %identification.card_name,
            tcg_name = %identification.tcg_name,
            "Card name has no usable characters"
        );
        return Ok(Outcome::Unidentified(task.path.clone()));
    }
    let preferred = match task.path.extension() {
        Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
        None => stem,
    };

    let directory = task.destination_dir()?;
    let name = relocate(&task.path, directory, &preferred)?;
    let to = directory.join(&name);
    if to == task.path {
        return Ok(Outcome::Unchanged(to));
    }

    tracing::info!(
        from = %task.path.display(),
        to = %to.display(),
        tcg_name = %identification.tcg_name,
        "Renamed"
    );
    Ok(Outcome::Renamed { from: task.path.clone(), to })
}
