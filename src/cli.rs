//! Command-line arguments.

use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};

/// Identify trading card scans left in `<game>/<set>/Errors` folders and file
/// them in their set folder under the card's name.
#[derive(Debug, Parser)]
#[command(name = "tcg-companion", version)]
pub struct Cli {
    /// Folder holding the `<game>/<set>` tree [default: the executable's folder]
    pub base_dir: Option<PathBuf>,
    /// Configuration file [default: tcg.cfg next to the executable]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Log file, appended to [default: log.txt next to the executable]
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
    /// Exit straight away instead of waiting for Enter
    #[arg(long)]
    pub no_pause: bool,
}

/// Arguments with every default filled in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    pub base_dir: PathBuf,
    pub config: PathBuf,
    pub log_file: PathBuf,
    pub pause: bool,
}

pub const LOG_FILE_NAME: &str = "log.txt";

impl Cli {
    pub fn resolve(self, exe_dir: &Path) -> Paths {
        Paths {
            base_dir: self.base_dir.unwrap_or_else(|| exe_dir.to_path_buf()),
            config: self.config.unwrap_or_else(|| exe_dir.join(tcg_config::CONFIG_FILE_NAME)),
            log_file: self.log_file.unwrap_or_else(|| exe_dir.join(LOG_FILE_NAME)),
            pause: !self.no_pause,
        }
    }
}

/// The folder containing the running executable, falling back to the working
/// directory when that can't be determined.
pub fn executable_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
