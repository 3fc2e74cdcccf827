//! Port definitions for image caching and loading.

use std::sync::Arc;

use crate::domain::deferred::ImageSlot;
use crate::domain::entities::{ImageId, ImageRequest, LoadedImage};

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur while resolving an image.
///
/// The widget collapses all of these into a single terminal failed state;
/// the taxonomy exists for logging and status display.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Image not found in cache.
    #[error("Image not found: {0}")]
    NotFound(String),
    /// Failed to decode image.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// Network error during download.
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Port for image caching operations.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Attempts to get an image from the cache.
    /// Returns None if not cached.
    async fn get(&self, id: &ImageId) -> Option<Arc<image::DynamicImage>>;

    /// Stores an image in the cache.
    async fn put(&self, id: ImageId, image: Arc<image::DynamicImage>);

    /// Removes an image from the cache.
    async fn evict(&self, id: &ImageId);

    /// Returns the current number of cached images.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all images from the cache.
    async fn clear(&self);
}

/// Port for resolving images from their sources.
///
/// There is no cancellation: once a resolve starts it runs to completion or
/// failure, even if every requester has been discarded.
#[async_trait::async_trait]
pub trait ImageLoaderPort: Send + Sync {
    /// Loads an image, checking caches first then the source.
    /// Returns the loaded image with provenance information.
    async fn load(&self, request: &ImageRequest) -> CacheResult<LoadedImage>;

    /// Begins resolving a request without blocking and returns the slot the
    /// result will be delivered through. Concurrent requests for the same
    /// locator share one underlying resolve.
    fn request(&self, request: ImageRequest) -> ImageSlot;

    /// Prefetches a request into cache without returning a slot.
    fn prefetch(&self, request: ImageRequest);
}
