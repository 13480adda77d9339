//! Sorting identified trading card scans into their set folders.
//!
//! Expects a library laid out as `<base>/<game>/<set>/`, where each set may
//! hold an `Errors` folder of scans that were not identified the first time
//! round. [`process_directory`] sends each of those scans to a
//! [`Recognizer`](tcg_recognize::Recognizer), names the file after the card
//! (see [`sanitize_filename`]) and moves it up into the set folder.

pub mod error;
pub mod organize;
pub mod scan;
mod sanitize;

pub use crate::organize::{Event, ImageTask, Options, Outcome, Reporter, Summary};
pub use crate::organize::{organize_image, process_directory, relocate};
pub use crate::sanitize::sanitize_filename;
