use std::fmt::{self, Debug, Formatter};

use bytes::Bytes;
use mime::Mime;

/// An image attached to a turn.
///
/// The data is kept as raw bytes. Providers encode it however their wire
/// format requires.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageAttachment {
    mime: Mime,
    data: Bytes,
}

impl ImageAttachment {
    /// Creates an attachment from raw image bytes and their MIME type.
    #[inline]
    pub fn new(mime: Mime, data: impl Into<Bytes>) -> Self {
        Self {
            mime,
            data: data.into(),
        }
    }

    /// Returns the MIME type of the image.
    #[inline]
    pub fn mime(&self) -> &Mime {
        &self.mime
    }

    /// Returns the raw image bytes.
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Debug for ImageAttachment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("mime", &self.mime.essence_str())
            .field("len", &self.data.len())
            .finish()
    }
}
