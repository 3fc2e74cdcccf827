//! Infrastructure layer with caches, resolvers, and configuration.

/// Application configuration.
pub mod config;
/// Image resolution (caching, fetching, decoding).
pub mod image;

pub use config::{AppConfig, CliArgs, ConfigStore, LogLevel, ProtocolMode};
pub use image::{
    CacheStats, DiskImageCache, ImageLoadedEvent, ImageLoader, ImageLoaderConfig, MemoryImageCache,
};
