use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::organize::error::{ErrorKind as OrganizeErrorKind, Result as OrganizeResult};
use crate::organize::file::{ImageTask, Outcome, organize_image_inner, relative_to};
use crate::scan;
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};
use tcg_recognize::Recognizer;
use tracing::instrument;

/// How a batch should behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// Remove `Errors` folders that are empty once their images are processed.
    pub cleanup: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { cleanup: true }
    }
}

/// Running totals for a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// `Errors` folders visited.
    pub folders: u64,
    /// Images found across all of them.
    pub discovered: u64,
    pub renamed: u64,
    pub unchanged: u64,
    pub unidentified: u64,
    /// Identified, but could not be moved.
    pub failed: u64,
    /// `Errors` folders removed by cleanup.
    pub removed: u64,
}

/// Progress events emitted by [`process_directory`].
///
/// Every path is relative to the base directory of the batch.
///
/// For each `Errors` folder: one [`FolderStarted`](Self::FolderStarted), then
/// one event per image, then [`FolderRemoved`](Self::FolderRemoved) if the
/// folder was cleaned up. [`Complete`](Self::Complete) is always last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    FolderStarted { folder: PathBuf, images: u64 },
    Renamed { from: PathBuf, to: PathBuf },
    Unchanged(PathBuf),
    Unidentified(PathBuf),
    Failed(PathBuf),
    FolderRemoved(PathBuf),
    Complete(Summary),
}

/// Receives [`Event`]s as a batch progresses.
pub trait Reporter {
    fn report(&mut self, event: Event);
}

impl<F: FnMut(Event)> Reporter for F {
    fn report(&mut self, event: Event) {
        self(event)
    }
}

/// Identifies and relocates every card image in every
/// `<base>/<game>/<set>/Errors` folder.
///
/// Images that cannot be identified, or cannot be moved, are left where they
/// are and the batch carries on. When [`Options::cleanup`] is set, an `Errors`
/// folder that is completely empty afterwards is removed; anything left in it
/// (including empty subfolders) keeps it.
///
/// # Errors
/// Only when `base` is not a directory. Everything else is reported through
/// `reporter` and counted in the returned [`Summary`].
#[instrument(skip_all, fields(base = %base.display()))]
pub fn process_directory<R, P>(base: &Path, recognizer: &R, options: &Options, reporter: &mut P) -> LibraryResult<Summary>
where
    R: Recognizer + ?Sized,
    P: Reporter + ?Sized,
{
    if !base.is_dir() {
        exn::bail!(LibraryErrorKind::NotADirectory(base.to_path_buf()));
    }

    let mut summary = Summary::default();
    for folder in scan::errors_folders(base) {
        let images = scan::images(&folder);
        let count = u64::try_from(images.len()).unwrap_or(u64::MAX);
        summary.folders += 1;
        summary.discovered += count;
        tracing::info!(folder = %folder.display(), images = count, "Processing errors folder");
        reporter.report(Event::FolderStarted { folder: relative_to(&folder, base), images: count });

        for image in images {
            let task = ImageTask::new(image, &folder, base);
            let event = match organize_image_inner(&task, recognizer) {
                Ok(Outcome::Renamed { from, to }) => {
                    summary.renamed += 1;
                    Event::Renamed { from: relative_to(&from, base), to: relative_to(&to, base) }
                },
                Ok(Outcome::Unchanged(path)) => {
                    summary.unchanged += 1;
                    Event::Unchanged(relative_to(&path, base))
                },
                Ok(Outcome::Unidentified(path)) => {
                    summary.unidentified += 1;
                    Event::Unidentified(relative_to(&path, base))
                },
                Err(e) => {
                    tracing::error!(path = %task.path.display(), error = ?e, "Failed to organize image");
                    summary.failed += 1;
                    Event::Failed(task.relative())
                },
            };
            reporter.report(event);
        }

        if options.cleanup {
            match remove_if_empty(&folder) {
                Ok(true) => {
                    summary.removed += 1;
                    reporter.report(Event::FolderRemoved(relative_to(&folder, base)));
                },
                Ok(false) => tracing::debug!(folder = %folder.display(), "Errors folder not empty, keeping it"),
                Err(e) => tracing::error!(folder = %folder.display(), error = ?e, "Failed to remove errors folder"),
            }
        }
    }

    tracing::info!(
        folders = summary.folders,
        renamed = summary.renamed,
        unidentified = summary.unidentified,
        failed = summary.failed,
        "Processing complete"
    );
    reporter.report(Event::Complete(summary));
    Ok(summary)
}

/// Removes `dir` if it has no entries at all. Returns whether it was removed.
fn remove_if_empty(dir: &Path) -> OrganizeResult<bool> {
    let error = || OrganizeErrorKind::Cleanup(dir.to_path_buf());
    if fs::read_dir(dir).or_raise(error)?.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(dir).or_raise(error)?;
    tracing::info!(folder = %dir.display(), "Removed empty errors folder");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::Exn;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tcg_recognize::error::{ErrorKind as RecognizeErrorKind, Result as RecognizeResult};
    use tcg_recognize::{CardImage, Identification};

    /// Answers by the image's file name; unknown files fail to identify.
    struct Stub {
        answers: HashMap<&'static str, &'static str>,
        calls: RefCell<u64>,
    }

    impl Stub {
        fn new(answers: &[(&'static str, &'static str)]) -> Self {
            Self { answers: answers.iter().copied().collect(), calls: RefCell::new(0) }
        }
    }

    impl Recognizer for Stub {
        fn identify(&self, image: &CardImage) -> RecognizeResult<Identification> {
            *self.calls.borrow_mut() += 1;
            let name = image.path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            match self.answers.get(name) {
                Some(card) => Ok(Identification::new(*card, "Yu-Gi-Oh")),
                None => Err(Exn::from(RecognizeErrorKind::Status(500))),
            }
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn touch(base: &Path, relative: &str) -> PathBuf {
        let path = base.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, relative.as_bytes()).unwrap();
        path
    }

    fn run(base: &Path, stub: &Stub, cleanup: bool) -> (Summary, Vec<Event>) {
        let mut events: Vec<Event> = vec![];
        let summary =
            process_directory(base, stub, &Options { cleanup }, &mut |event: Event| events.push(event)).unwrap();
        (summary, events)
    }

    #[rstest]
    #[case::cleanup(true)]
    #[case::keep(false)]
    fn test_single_card(#[case] cleanup: bool) {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(base, "GameA/SetA/Errors/card1.jpg");
        let stub = Stub::new(&[("card1.jpg", "Blue-Eyes White Dragon")]);

        let (summary, events) = run(base, &stub, cleanup);

        assert!(base.join("GameA/SetA/Blue-Eyes White Dragon.jpg").is_file());
        assert!(!base.join("GameA/SetA/Errors/card1.jpg").exists());
        let errors = base.join("GameA/SetA/Errors");
        if cleanup {
            assert!(!errors.exists());
        } else {
            assert!(errors.is_dir());
            assert_eq!(fs::read_dir(&errors).unwrap().count(), 0);
        }

        let mut expected = vec![
            Event::FolderStarted { folder: PathBuf::from("GameA/SetA/Errors"), images: 1 },
            Event::Renamed {
                from: PathBuf::from("GameA/SetA/Errors/card1.jpg"),
                to: PathBuf::from("GameA/SetA/Blue-Eyes White Dragon.jpg"),
            },
        ];
        if cleanup {
            expected.push(Event::FolderRemoved(PathBuf::from("GameA/SetA/Errors")));
        }
        expected.push(Event::Complete(summary));
        assert_eq!(events, expected);
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.removed, u64::from(cleanup));
    }

    #[test]
    fn test_unidentified_keeps_file_and_folder() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        let unknown = touch(base, "GameA/SetA/Errors/mystery.png");
        touch(base, "GameA/SetA/Errors/card1.jpg");
        let stub = Stub::new(&[("card1.jpg", "Dark Magician")]);

        let (summary, events) = run(base, &stub, true);

        assert!(unknown.is_file());
        assert!(base.join("GameA/SetA/Errors").is_dir());
        assert!(base.join("GameA/SetA/Dark Magician.jpg").is_file());
        assert!(events.contains(&Event::Unidentified(PathBuf::from("GameA/SetA/Errors/mystery.png"))));
        assert!(!events.iter().any(|e| matches!(e, Event::FolderRemoved(_))));
        assert_eq!(
            summary,
            Summary { folders: 1, discovered: 2, renamed: 1, unidentified: 1, ..Summary::default() }
        );
    }

    #[test]
    fn test_unidentified_is_logged_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(base, "GameA/SetA/Errors/mystery.png");
        let stub = Stub::new(&[]);
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt().with_ansi(false).with_writer(move || writer.clone()).finish();

        let (summary, _) = tracing::subscriber::with_default(subscriber, || run(base, &stub, true));

        assert_eq!(summary.unidentified, 1);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let line = logs.lines().find(|line| line.contains("Failed to identify card")).unwrap_or_else(|| panic!("{logs}"));
        assert!(line.contains("ERROR"), "{line}");
        assert!(line.contains("mystery.png"), "{line}");
    }

    #[test]
    fn test_colliding_names_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(base, "GameA/SetA/Kuriboh.jpg");
        touch(base, "GameA/SetA/Errors/a.jpg");
        touch(base, "GameA/SetA/Errors/b.jpg");
        let stub = Stub::new(&[("a.jpg", "Kuriboh"), ("b.jpg", "Kuriboh")]);

        let (summary, _) = run(base, &stub, true);

        assert_eq!(summary.renamed, 2);
        let set = base.join("GameA/SetA");
        assert_eq!(fs::read(set.join("Kuriboh.jpg")).unwrap(), b"GameA/SetA/Kuriboh.jpg");
        assert_eq!(fs::read(set.join("Kuriboh_1.jpg")).unwrap(), b"GameA/SetA/Errors/a.jpg");
        assert_eq!(fs::read(set.join("Kuriboh_2.jpg")).unwrap(), b"GameA/SetA/Errors/b.jpg");
    }

    #[test]
    fn test_empty_sanitized_name_is_unidentified() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        let card = touch(base, "GameA/SetA/Errors/card1.jpg");
        let stub = Stub::new(&[("card1.jpg", "★☆★")]);

        let (summary, _) = run(base, &stub, true);

        assert!(card.is_file());
        assert_eq!(summary.unidentified, 1);
        assert_eq!(summary.removed, 0);
    }

    #[test]
    fn test_nested_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(base, "GameA/SetA/Errors/batch1/card1.jpg");
        touch(base, "GameA/SetA/Errors/batch2/more/card2.PNG");
        let stub = Stub::new(&[("card1.jpg", "Exodia"), ("card2.PNG", "Mirror Force")]);

        let (summary, _) = run(base, &stub, true);

        assert!(base.join("GameA/SetA/Exodia.jpg").is_file());
        assert!(base.join("GameA/SetA/Mirror Force.PNG").is_file());
        assert_eq!(summary.renamed, 2);
        // The emptied subfolders still keep the Errors folder around.
        assert!(base.join("GameA/SetA/Errors").is_dir());
        assert_eq!(summary.removed, 0);
    }

    #[test]
    fn test_multiple_games_and_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(base, "GameA/SetA/Errors/a.jpg");
        touch(base, "GameB/SetX/Errors/b.jpeg");
        touch(base, "GameB/SetX/Errors/readme.txt");
        fs::create_dir_all(base.join("GameB/SetY")).unwrap();
        let stub = Stub::new(&[("a.jpg", "Celtic Guardian"), ("b.jpeg", "Black Lotus")]);

        let (summary, events) = run(base, &stub, true);

        assert_eq!(*stub.calls.borrow(), 2);
        assert_eq!(summary.folders, 2);
        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.renamed, 2);
        assert_eq!(summary.removed, 1);
        assert!(base.join("GameB/SetX/Errors/readme.txt").is_file());
        assert!(!base.join("GameA/SetA/Errors").exists());
        assert_eq!(events.first(), Some(&Event::FolderStarted { folder: PathBuf::from("GameA/SetA/Errors"), images: 1 }));
        assert_eq!(events.last(), Some(&Event::Complete(summary)));
    }

    #[test]
    fn test_empty_errors_folder_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("GameA/SetA/Errors")).unwrap();
        let stub = Stub::new(&[]);

        let (summary, events) = run(base, &stub, true);

        assert_eq!(summary.removed, 1);
        assert_eq!(
            events,
            vec![
                Event::FolderStarted { folder: PathBuf::from("GameA/SetA/Errors"), images: 0 },
                Event::FolderRemoved(PathBuf::from("GameA/SetA/Errors")),
                Event::Complete(summary),
            ]
        );
    }

    #[test]
    fn test_base_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "not-a-dir.txt");
        let stub = Stub::new(&[]);
        let mut events: Vec<Event> = vec![];

        for base in [file, dir.path().join("missing")] {
            let err = process_directory(&base, &stub, &Options::default(), &mut |e: Event| events.push(e)).unwrap_err();
            assert!(matches!(&*err, LibraryErrorKind::NotADirectory(_)));
        }
        assert!(events.is_empty());
    }

    #[test]
    fn test_remove_if_empty() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        assert!(remove_if_empty(&empty).unwrap());
        assert!(!empty.exists());

        touch(dir.path(), "full/file.jpg");
        assert!(!remove_if_empty(&dir.path().join("full")).unwrap());

        let err = remove_if_empty(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*err, OrganizeErrorKind::Cleanup(_)));
    }
}
