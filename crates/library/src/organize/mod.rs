//! Moving identified cards out of their `Errors` folders.
//!
//! [`process_directory`] is the batch entry point: it finds every
//! `<game>/<set>/Errors` folder under a base directory (see [`crate::scan`]),
//! passes each image to [`organize_image`], and reports progress as
//! [`Event`]s to a [`Reporter`]. Per-image failures never stop the batch.
//!
//! [`relocate`] is the collision-safe move underneath: an existing file is
//! never overwritten; instead the new file gets a `_1`, `_2`, … suffix.

mod conflict;
pub mod error;
mod file;
mod run;

pub use self::conflict::relocate;
pub use self::file::{ImageTask, Outcome, organize_image};
pub use self::run::{Event, Options, Reporter, Summary, process_directory};
