//! A [`figment`] provider for flat `key=value` configuration files.
//!
//! The format is deliberately simple so that it can be edited by hand in
//! Notepad:
//!
//! ```text
//! # Lines starting with a hash are ignored.
//! openai_api_key=sk-...
//! logging_level=INFO
//! CleanUpMode=false
//! ```
//!
//! Keys are trimmed and lower-cased so that they line up with the keys
//! produced by [`figment::providers::Env`]. Values are trimmed and always
//! emitted as strings; typed fields on [`Config`](crate::Config) parse them.
//! When a key is repeated the last occurrence wins.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::value::{Dict, Map, Value};
use figment::{Metadata, Profile, Provider, Source};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

/// The contents of a `key=value` configuration file, ready to be merged into a
/// [`figment::Figment`].
#[derive(Clone, Debug, Default)]
pub struct KeyValueFile {
    path: Option<PathBuf>,
    contents: String,
}

impl KeyValueFile {
    /// Reads the file at `path`.
    ///
    /// A file that does not exist is not an error: it provides no values, and
    /// the missing-API-key check decides whether that is fatal.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Configuration file not found");
                String::new()
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Unreadable(path.to_path_buf())),
        };
        Ok(Self { path: Some(path.to_path_buf()), contents })
    }

    /// Wraps in-memory contents that did not come from a file.
    pub fn from_contents(contents: impl Into<String>) -> Self {
        Self { path: None, contents: contents.into() }
    }

    fn entries(&self) -> Dict {
        let mut dict = Dict::new();
        for line in self.contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!(line, "Ignoring configuration line without '='");
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            dict.insert(key, Value::from(value.trim().to_string()));
        }
        dict
    }
}

impl Provider for KeyValueFile {
    fn metadata(&self) -> Metadata {
        match &self.path {
            Some(path) => Metadata::from("key=value file", Source::File(path.clone())),
            None => Metadata::named("key=value contents"),
        }
    }

    fn data(&self) -> std::result::Result<Map<Profile, Dict>, figment::Error> {
        Ok(Profile::Default.collect(self.entries()))
    }
}
