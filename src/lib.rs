//! Snapview - An asynchronous image viewer widget for ratatui.
//!
//! This crate provides a deferred image resolution pipeline with tri-state
//! rendering (placeholder, image, fallback), memory and disk caching, and a
//! small gallery viewer binary built on the widget.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing services used by the viewer binary.
pub mod application;
/// Domain layer containing entities, the handoff slot, and port definitions.
pub mod domain;
/// Infrastructure layer containing caches, the loader, and configuration.
pub mod infrastructure;
/// Presentation layer containing the widget and the viewer UI.
pub mod presentation;

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "snapview";
