//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::infrastructure::image::{disk_cache, fetch, memory_cache};

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Terminal graphics protocol selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolMode {
    /// Query the terminal and pick the best protocol it supports.
    #[default]
    Auto,
    /// Unicode half-block cells. Works everywhere.
    Halfblocks,
    /// Sixel graphics.
    Sixel,
    /// Kitty graphics protocol.
    Kitty,
    /// iTerm2 inline images.
    Iterm2,
}

impl std::fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Halfblocks => write!(f, "halfblocks"),
            Self::Sixel => write!(f, "sixel"),
            Self::Kitty => write!(f, "kitty"),
            Self::Iterm2 => write!(f, "iterm2"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Skip memory and disk caches entirely.
    #[serde(default)]
    pub no_cache: bool,

    /// Cache and resolve tuning.
    #[serde(default)]
    pub cache: CacheConfig,

    /// UI configuration.
    #[serde(default)]
    pub ui: UiConfig,
}

/// Cache and resolve tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum decoded images held in memory.
    #[serde(default = "default_memory_entries")]
    pub memory_entries: usize,

    /// Maximum disk cache size in bytes.
    #[serde(default = "default_disk_max_bytes")]
    pub disk_max_bytes: u64,

    /// Maximum concurrent fetches.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cap on decoded width in pixels.
    #[serde(default = "default_max_decode_width")]
    pub max_decode_width: u32,

    /// Cap on decoded height in pixels.
    #[serde(default = "default_max_decode_height")]
    pub max_decode_height: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_entries: default_memory_entries(),
            disk_max_bytes: default_disk_max_bytes(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            timeout_secs: default_timeout_secs(),
            max_decode_width: default_max_decode_width(),
            max_decode_height: default_max_decode_height(),
        }
    }
}

/// UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Terminal graphics protocol to use.
    #[serde(default)]
    pub protocol: ProtocolMode,

    /// Show the status bar.
    #[serde(default = "default_true")]
    pub show_status_bar: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolMode::default(),
            show_status_bar: true,
        }
    }
}

fn default_memory_entries() -> usize {
    memory_cache::DEFAULT_CACHE_SIZE
}

fn default_disk_max_bytes() -> u64 {
    disk_cache::DEFAULT_MAX_CACHE_SIZE
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_decode_width() -> u32 {
    fetch::DEFAULT_MAX_DECODE_WIDTH
}

fn default_max_decode_height() -> u32 {
    fetch::DEFAULT_MAX_DECODE_HEIGHT
}

fn default_true() -> bool {
    true
}

use super::args::CliArgs;
use crate::infrastructure::image::ImageLoaderConfig;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if args.no_cache {
            self.no_cache = true;
        }
        if let Some(protocol) = args.protocol {
            self.ui.protocol = protocol;
        }
        if let Some(timeout) = args.timeout {
            self.cache.timeout_secs = timeout;
        }
    }

    /// Builds the loader configuration from the cache section.
    #[must_use]
    pub const fn loader_config(&self) -> ImageLoaderConfig {
        ImageLoaderConfig {
            memory_cache_size: self.cache.memory_entries,
            disk_cache_size: self.cache.disk_max_bytes,
            max_concurrent_fetches: self.cache.max_concurrent_fetches,
            timeout_secs: self.cache.timeout_secs,
            max_decode_width: self.cache.max_decode_width,
            max_decode_height: self.cache.max_decode_height,
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, crate::NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, crate::NAME)
            .map(|dirs| dirs.data_dir().join(format!("{}.log", crate::NAME)))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            no_cache: false,
            cache: CacheConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_with_overrides() {
        let toml_content = r#"
            log_level = "debug"
            no_cache = true

            [cache]
            memory_entries = 8
            timeout_secs = 5

            [ui]
            protocol = "sixel"
            show_status_bar = false
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.no_cache);
        assert_eq!(config.cache.memory_entries, 8);
        assert_eq!(config.cache.timeout_secs, 5);
        assert_eq!(config.ui.protocol, ProtocolMode::Sixel);
        assert!(!config.ui.show_status_bar);

        // Unspecified fields keep their defaults.
        assert_eq!(config.cache.max_concurrent_fetches, 4);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.no_cache);
        assert_eq!(config.ui.protocol, ProtocolMode::Auto);
        assert!(config.ui.show_status_bar);
    }

    #[test]
    fn test_loader_config_mirrors_cache_section() {
        let mut config = AppConfig::default();
        config.cache.memory_entries = 3;
        config.cache.max_decode_width = 64;

        let loader = config.loader_config();
        assert_eq!(loader.memory_cache_size, 3);
        assert_eq!(loader.max_decode_width, 64);
    }
}
