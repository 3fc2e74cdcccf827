//! Presentation layer with the widget and the viewer UI.

/// The viewer application.
pub mod ui;
/// Reusable widgets.
pub mod widgets;

pub use ui::App;
pub use widgets::{ImageView, ImageViewState, ProtocolSelector, Tint};
