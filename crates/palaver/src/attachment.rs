use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::path::Path;

use mime::Mime;
use palaver_model::ImageAttachment;

/// Error returned by [`load_image`].
#[derive(Debug)]
pub enum LoadImageError {
    /// The file extension is not a supported image type.
    UnsupportedType,
    /// The file could not be read.
    Io(io::Error),
}

impl Display for LoadImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType => "unsupported image type".fmt(f),
            Self::Io(err) => write!(f, "failed to read image: {err}"),
        }
    }
}

impl Error for LoadImageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnsupportedType => None,
            Self::Io(err) => Some(err),
        }
    }
}

/// Guesses the MIME type of an image from its file extension.
pub fn mime_for_path(path: &Path) -> Option<Mime> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(mime::IMAGE_PNG),
        "jpg" | "jpeg" => Some(mime::IMAGE_JPEG),
        "gif" => Some(mime::IMAGE_GIF),
        "bmp" => Some(mime::IMAGE_BMP),
        "webp" => "image/webp".parse().ok(),
        _ => None,
    }
}

/// Reads an image file into an attachment.
pub async fn load_image(
    path: impl AsRef<Path>,
) -> Result<ImageAttachment, LoadImageError> {
    let path = path.as_ref();
    let mime = mime_for_path(path).ok_or(LoadImageError::UnsupportedType)?;
    let data = tokio::fs::read(path).await.map_err(LoadImageError::Io)?;
    debug!("loaded {} ({} bytes)", path.display(), data.len());
    Ok(ImageAttachment::new(mime, data))
}
