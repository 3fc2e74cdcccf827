mod image_view;
mod picker;
mod placeholder;
mod status_bar;

pub use image_view::{ImageView, ImageViewState, Tint};
pub use picker::ProtocolSelector;
pub use placeholder::{Fallback, Placeholder};
pub use status_bar::StatusBar;
