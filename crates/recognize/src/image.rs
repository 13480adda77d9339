use crate::error::{ErrorKind, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};

/// Image formats the batch will pick up from an `Errors` folder.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Returns `true` when the path has one of the [`IMAGE_EXTENSIONS`], in any case.
pub fn is_card_image(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Raw bytes of a card image along with the media type sent to the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardImage {
    pub path: PathBuf,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl CardImage {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let media_type = media_type(&path);
        Self { path, media_type, bytes }
    }

    /// Reads the image from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
        Ok(Self::new(path, bytes))
    }

    /// Inlines the image as a `data:` URL suitable for an `image_url` content part.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes))
    }
}

/// PNGs are labelled as such; everything else is sent as JPEG.
fn media_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    }
}
