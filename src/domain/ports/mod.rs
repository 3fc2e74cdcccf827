//! Port definitions.

mod image_cache_port;

pub use image_cache_port::{CacheError, CacheResult, ImageCachePort, ImageLoaderPort};
