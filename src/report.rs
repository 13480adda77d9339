//! Console progress output.

use std::io::{self, Stdout, Write};
use tcg_library::{Event, Reporter, Summary};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Prints batch progress for the person running the tool.
///
/// Failures only get a timestamped pointer to the log file; the details are in
/// the log.
pub struct ConsoleReporter<W: Write> {
    out: W,
    log_name: String,
    offset: UtcOffset,
    clock: fn() -> OffsetDateTime,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout(log_name: impl Into<String>) -> Self {
        Self::new(io::stdout(), log_name)
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// The local offset is looked up once, here: it can't be determined
    /// reliably once other threads are running.
    pub fn new(out: W, log_name: impl Into<String>) -> Self {
        Self {
            out,
            log_name: log_name.into(),
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn timestamp(&self) -> String {
        let now = (self.clock)().to_offset(self.offset);
        now.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
            .unwrap_or_else(|_| now.unix_timestamp().to_string())
    }

    fn write(&mut self, event: &Event) -> io::Result<()> {
        match event {
            Event::FolderStarted { folder, images } => {
                writeln!(self.out, "Now processing {} directory", folder.display())?;
                writeln!(self.out, "Found {images} error files")
            },
            Event::Renamed { from, to } => {
                writeln!(self.out, "Renamed '{}' to '{}'", from.display(), to.display())
            },
            Event::Unchanged(path) => writeln!(self.out, "'{}' is already correctly named", path.display()),
            Event::Unidentified(_) | Event::Failed(_) => {
                let timestamp = self.timestamp();
                writeln!(self.out, "{timestamp} - Error occurred. Check {} for details.", self.log_name)
            },
            Event::FolderRemoved(folder) => writeln!(self.out, "Removed empty directory: {}", folder.display()),
            Event::Complete(summary) => writeln!(self.out, "{}", describe(summary)),
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, event: Event) {
        if let Err(e) = self.write(&event).and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "Unable to write to console");
        }
    }
}

fn describe(summary: &Summary) -> String {
    let left = summary.unidentified + summary.failed;
    format!(
        "Renamed {} of {} files across {} Errors folders; {left} left for review.",
        summary.renamed, summary.discovered, summary.folders
    )
}
