use crate::organize::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

/// Moves `source` into `directory` under the `preferred` file name, never
/// overwriting anything that is already there.
///
/// If `directory/preferred` is taken, the name is split into stem and
/// extension and a counter is appended to the stem (`Charizard.png`, then
/// `Charizard_1.png`, `Charizard_2.png`, …) until a free name is found.
/// The destination directory (and its ancestors) is created when missing.
///
/// Returns the file name that was actually used. When `source` already *is*
/// `directory/preferred`, nothing is moved and `preferred` is returned.
pub fn relocate(source: &Path, directory: &Path, preferred: &str) -> Result<String> {
    validate_name(preferred)?;
    fs::create_dir_all(directory).or_raise(|| ErrorKind::CreateDirectory(directory.to_path_buf()))?;

    if is_same_file(source, &directory.join(preferred)) {
        tracing::debug!(path = %source.display(), "File already has its preferred name");
        return Ok(preferred.to_string());
    }

    let name = free_name(directory, preferred)?;
    let destination = directory.join(&name);
    move_file(source, &destination)?;
    Ok(name)
}

/// The name must be exactly one normal path component: no separators, no
/// `.`/`..`, nothing that would escape `directory`.
fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(n)), None) if n == OsStr::new(name) => Ok(()),
        _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    a == b || matches!((fs::canonicalize(a), fs::canonicalize(b)), (Ok(a), Ok(b)) if a == b)
}

/// Finds the first name, starting with `preferred`, that nothing in
/// `directory` occupies. Broken symlinks count as occupied.
fn free_name(directory: &Path, preferred: &str) -> Result<String> {
    let preferred_path = Path::new(preferred);
    let stem = preferred_path.file_stem().map(OsStr::to_string_lossy).unwrap_or_default();
    let extension = preferred_path.extension().map(OsStr::to_string_lossy);

    let mut name = preferred.to_string();
    let mut count: u64 = 1;
    while is_occupied(&directory.join(&name))? {
        name = match &extension {
            Some(ext) => format!("{stem}_{count}.{ext}"),
            None => format!("{stem}_{count}"),
        };
        count += 1;
    }
    Ok(name)
}

fn is_occupied(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).or_raise(|| ErrorKind::Probe(path.to_path_buf())),
    }
}

/// Rename, falling back to copy-then-delete across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    let error = || ErrorKind::Move { from: from.to_path_buf(), to: to.to_path_buf() };
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::CrossesDevices => {
            fs::copy(from, to).or_raise(error)?;
            if let Err(e) = fs::remove_file(from) {
                // Don't leave two copies behind; the source stays for manual review.
                _ = fs::remove_file(to);
                return Err(e).or_raise(error);
            }
            Ok(())
        },
        Err(e) => Err(e).or_raise(error),
    }
}
