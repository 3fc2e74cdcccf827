//! Domain types for image handling.

use std::sync::Arc;

/// Unique identifier for a cached image.
/// Generated from a hash of the source locator (URL or file path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(pub String);

impl ImageId {
    /// Creates a new `ImageId` from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an `ImageId` from a locator by hashing it.
    #[must_use]
    pub fn from_locator(locator: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(locator.as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Status of an image in the resolve pipeline, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    /// Resolution has not produced a result yet.
    #[default]
    Pending,
    /// Image is decoded and displayed.
    Ready,
    /// Resolution failed with an error message. Terminal, never retried.
    Failed(String),
}

impl ImageStatus {
    /// Returns true if the image is ready for rendering.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the image is still resolving.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if resolution failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A decoded image together with its cache provenance.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Identifier the image was requested under.
    pub id: ImageId,
    /// The decoded image data.
    pub image: Arc<image::DynamicImage>,
    /// Where the image was found.
    pub source: ImageSource,
}

/// Where an image was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Loaded from in-memory LRU cache.
    MemoryCache,
    /// Loaded from disk cache.
    DiskCache,
    /// Downloaded from network.
    Network,
    /// Read from the local filesystem.
    File,
    /// Decoded from bytes bundled with the application.
    Bundled,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::DiskCache => write!(f, "disk"),
            Self::Network => write!(f, "network"),
            Self::File => write!(f, "file"),
            Self::Bundled => write!(f, "bundled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_from_locator() {
        let url = "https://example.com/photos/cat.png";
        let id = ImageId::from_locator(url);
        assert!(!id.0.is_empty());
        assert_eq!(id.0.len(), 32);
    }

    #[test]
    fn test_image_id_consistency() {
        let url = "https://example.com/image.png";
        let id1 = ImageId::from_locator(url);
        let id2 = ImageId::from_locator(url);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_image_id_distinguishes_locators() {
        let id1 = ImageId::from_locator("/tmp/a.png");
        let id2 = ImageId::from_locator("/tmp/b.png");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_status_predicates() {
        assert!(ImageStatus::Pending.is_pending());
        assert!(ImageStatus::Ready.is_ready());
        assert!(ImageStatus::Failed("decode".into()).is_failed());
        assert!(!ImageStatus::Failed("decode".into()).is_ready());
    }
}
