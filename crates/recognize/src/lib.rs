//! Trading card identification.
//!
//! The [`Recognizer`] trait is the seam between the batch pipeline and the
//! outside world: given the bytes of a card image, return the card's name and
//! the trading card game it belongs to. [`OpenAiClient`] implements it against
//! a vision-capable chat completion API; tests substitute their own stubs.
//!
//! Recognition never retries. Every failure (unreadable file, network error,
//! non-success status, unparsable reply) is terminal for that one image.

pub mod error;
mod image;
mod openai;
mod reply;

pub use crate::image::{CardImage, IMAGE_EXTENSIONS, is_card_image};
pub use crate::openai::{OpenAiClient, OpenAiSettings};
pub use crate::reply::{extract_json_object, parse_content, parse_response};

use crate::error::Result;
use std::path::Path;
use tracing::instrument;

/// A successful identification: both fields are present and non-blank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identification {
    /// The card's name as reported by the service (not yet sanitized).
    pub card_name: String,
    /// The trading card game, e.g. "Pokemon" or "Yu-Gi-Oh".
    pub tcg_name: String,
}

impl Identification {
    pub fn new(card_name: impl Into<String>, tcg_name: impl Into<String>) -> Self {
        Self { card_name: card_name.into(), tcg_name: tcg_name.into() }
    }
}

/// Something that can put a name to a card image.
pub trait Recognizer {
    fn identify(&self, image: &CardImage) -> Result<Identification>;
}

impl<R: Recognizer + ?Sized> Recognizer for &R {
    fn identify(&self, image: &CardImage) -> Result<Identification> {
        (**self).identify(image)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn identify(&self, image: &CardImage) -> Result<Identification> {
        (**self).identify(image)
    }
}

/// Reads the image at `path` and identifies it, logging any failure.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn identify_file<R: Recognizer + ?Sized>(recognizer: &R, path: &Path) -> Result<Identification> {
    let result = CardImage::read(path).and_then(|image| recognizer.identify(&image));
    match &result {
        Ok(identification) => tracing::debug!(
            card_name = %identification.card_name,
            tcg_name = %identification.tcg_name,
            "Card identified"
        ),
        Err(e) => tracing::error!(error = ?e, "Failed to identify card"),
    }
    result
}
