//! Image request sources.

use std::path::PathBuf;

use bytes::Bytes;

use super::image::ImageId;

/// A source an image can be resolved from.
///
/// The locator string is stable for a given source and is what the cache
/// key is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRequest {
    /// An image file on the local filesystem.
    File(PathBuf),
    /// An HTTP(S) resource.
    Url(String),
    /// Encoded image bytes bundled with the application, with a name used
    /// for display and cache keying.
    Bundled {
        /// Display name of the resource.
        name: String,
        /// The encoded image bytes.
        bytes: Bytes,
    },
}

impl ImageRequest {
    /// Creates a request for a filesystem path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Creates a request for an HTTP(S) URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Creates a request for bundled bytes.
    pub fn bundled(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::Bundled {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Returns the stable locator string for this request.
    #[must_use]
    pub fn locator(&self) -> String {
        match self {
            Self::File(path) => path.to_string_lossy().into_owned(),
            Self::Url(url) => url.clone(),
            Self::Bundled { name, .. } => format!("bundled:{name}"),
        }
    }

    /// Returns the cache identifier for this request.
    #[must_use]
    pub fn id(&self) -> ImageId {
        ImageId::from_locator(&self.locator())
    }

    /// Returns a short human-readable name for titles and status lines.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map_or_else(|| path.to_string_lossy().into_owned(), |n| {
                    n.to_string_lossy().into_owned()
                }),
            Self::Url(url) => url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map_or_else(|| url.clone(), |s| s.split('?').next().unwrap_or(s).to_string()),
            Self::Bundled { name, .. } => name.clone(),
        }
    }

    /// Returns true if this request goes over the network.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}
