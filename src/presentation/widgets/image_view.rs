//! The deferred image widget.
//!
//! Renders one of three things every frame: the materialized image, a static
//! placeholder while the resolve is pending, or a static fallback after a
//! permanent failure. The encoded terminal protocol plays the role of an
//! uploaded texture: it is built exactly once from the decoded image, the
//! decoded image is dropped immediately afterwards, and once it exists the
//! slot is never consulted again.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::StatefulWidget,
};
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;
use ratatui_image::{Resize, StatefulImage};

use crate::domain::deferred::{ImageSlot, SlotPoll};
use crate::domain::entities::ImageStatus;

use super::placeholder::{Fallback, Placeholder};

/// Tint applied to the view.
///
/// Terminal cells carry no alpha channel, so the alpha here is a gate: zero
/// alpha skips the frame entirely, including slot polling and protocol
/// creation. The color, when set, styles the placeholder and fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint {
    /// Substitute-graphic color override.
    pub color: Option<Color>,
    /// Opacity gate; only zero is special.
    pub alpha: u8,
}

impl Tint {
    /// Fully opaque, default colors.
    #[must_use]
    pub const fn opaque() -> Self {
        Self {
            color: None,
            alpha: 255,
        }
    }

    /// Fully transparent: the view draws nothing and does no resolve work.
    #[must_use]
    pub const fn transparent() -> Self {
        Self {
            color: None,
            alpha: 0,
        }
    }

    /// Opaque with a substitute-graphic color.
    #[must_use]
    pub const fn colored(color: Color) -> Self {
        Self {
            color: Some(color),
            alpha: 255,
        }
    }

    /// Returns true if nothing should be drawn.
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        self.alpha == 0
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::opaque()
    }
}

/// Render-side state of one image view.
pub struct ImageViewState {
    slot: ImageSlot,
    protocol: Option<StatefulProtocol>,
    native_size: Option<(u32, u32)>,
    status: ImageStatus,
}

impl ImageViewState {
    /// Creates state around the slot a resolver returned.
    #[must_use]
    pub fn new(slot: ImageSlot) -> Self {
        Self {
            slot,
            protocol: None,
            native_size: None,
            status: ImageStatus::Pending,
        }
    }

    /// Current user-visible status.
    #[must_use]
    pub const fn status(&self) -> &ImageStatus {
        &self.status
    }

    /// Native pixel dimensions, known once the image resolved.
    #[must_use]
    pub const fn native_size(&self) -> Option<(u32, u32)> {
        self.native_size
    }

    /// Returns true once the terminal protocol has been built.
    #[must_use]
    pub const fn is_materialized(&self) -> bool {
        self.protocol.is_some()
    }

    /// Replaces the slot and releases the materialized protocol.
    /// Used to re-request an image; the old protocol is dropped here,
    /// deterministically.
    pub fn reset(&mut self, slot: ImageSlot) {
        self.slot = slot;
        self.protocol = None;
        self.native_size = None;
        self.status = ImageStatus::Pending;
    }

    /// Polls the slot once and materializes the protocol on success.
    fn advance(&mut self, picker: &Picker) {
        match self.slot.poll() {
            SlotPoll::Pending | SlotPoll::Claimed => {}
            SlotPoll::Ready => {
                if let Some(image) = self.slot.take_ready() {
                    self.native_size = Some((image.width(), image.height()));
                    self.protocol = Some(picker.new_resize_protocol((*image).clone()));
                    self.status = ImageStatus::Ready;
                }
                // The decoded image Arc is dropped here; the slot keeps only
                // a claimed marker.
            }
            SlotPoll::Failed => {
                let message = self
                    .slot
                    .error()
                    .map_or_else(|| "resolve failed".to_string(), |e| e.to_string());
                self.status = ImageStatus::Failed(message);
            }
        }
    }
}

impl std::fmt::Debug for ImageViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageViewState")
            .field("slot", &self.slot)
            .field("materialized", &self.protocol.is_some())
            .field("native_size", &self.native_size)
            .field("status", &self.status)
            .finish()
    }
}

/// The image view widget.
///
/// Stateless itself; pair it with an [`ImageViewState`] via
/// `render_stateful_widget`.
pub struct ImageView<'a> {
    picker: &'a Picker,
    tint: Tint,
}

impl<'a> ImageView<'a> {
    /// Creates a view drawing through the given picker.
    #[must_use]
    pub const fn new(picker: &'a Picker) -> Self {
        Self {
            picker,
            tint: Tint::opaque(),
        }
    }

    /// Sets the tint.
    #[must_use]
    pub const fn tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }
}

impl StatefulWidget for ImageView<'_> {
    type State = ImageViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if self.tint.is_transparent() || area.is_empty() {
            return;
        }

        // A materialized image short-circuits everything else, permanently.
        if state.protocol.is_none() {
            state.advance(self.picker);
        }

        if let Some(protocol) = state.protocol.as_mut() {
            let image = StatefulImage::default().resize(Resize::Fit(None));
            StatefulWidget::render(image, area, buf, protocol);
            return;
        }

        match &state.status {
            ImageStatus::Pending => {
                let mut widget = Placeholder::new();
                if let Some(color) = self.tint.color {
                    widget = widget.color(color);
                }
                ratatui::widgets::Widget::render(widget, area, buf);
            }
            ImageStatus::Failed(_) => {
                let mut widget = Fallback::new();
                if let Some(color) = self.tint.color {
                    widget = widget.color(color);
                }
                ratatui::widgets::Widget::render(widget, area, buf);
            }
            // Ready without a protocol cannot happen: advance() only sets
            // Ready after materializing. Draw nothing rather than guess.
            ImageStatus::Ready => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CacheError;
    use crate::presentation::widgets::placeholder::{FALLBACK_CAPTION, PLACEHOLDER_CAPTION};
    use std::sync::Arc;

    fn test_picker() -> Picker {
        Picker::halfblocks()
    }

    fn render_frame(state: &mut ImageViewState, picker: &Picker, tint: Tint) -> Buffer {
        let area = Rect::new(0, 0, 30, 10);
        let mut buf = Buffer::empty(area);
        ImageView::new(picker).tint(tint).render(area, &mut buf, state);
        buf
    }

    fn buffer_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
        }
        out
    }

    fn test_image() -> Arc<image::DynamicImage> {
        Arc::new(image::DynamicImage::new_rgb8(8, 8))
    }

    #[test]
    fn test_pending_draws_placeholder_every_frame() {
        let picker = test_picker();
        let mut state = ImageViewState::new(ImageSlot::new());

        for _ in 0..3 {
            let buf = render_frame(&mut state, &picker, Tint::opaque());
            assert!(buffer_text(&buf).contains(PLACEHOLDER_CAPTION));
            assert!(!state.is_materialized());
        }
    }

    #[test]
    fn test_resolution_swaps_placeholder_for_image_in_one_frame() {
        let picker = test_picker();
        let slot = ImageSlot::new();
        let mut state = ImageViewState::new(slot.clone());

        let buf = render_frame(&mut state, &picker, Tint::opaque());
        assert!(buffer_text(&buf).contains(PLACEHOLDER_CAPTION));

        slot.fulfill(test_image());

        // The first frame after resolution already shows the image and not
        // the placeholder.
        let buf = render_frame(&mut state, &picker, Tint::opaque());
        assert!(!buffer_text(&buf).contains(PLACEHOLDER_CAPTION));
        assert!(state.is_materialized());
        assert_eq!(state.native_size(), Some((8, 8)));
        assert!(state.status().is_ready());
    }

    #[test]
    fn test_failure_draws_fallback_forever() {
        let picker = test_picker();
        let slot = ImageSlot::new();
        let mut state = ImageViewState::new(slot.clone());

        slot.fail(CacheError::NetworkError("404".into()));

        for _ in 0..3 {
            let buf = render_frame(&mut state, &picker, Tint::opaque());
            assert!(buffer_text(&buf).contains(FALLBACK_CAPTION));
            assert!(!state.is_materialized());
            assert!(state.status().is_failed());
        }
    }

    #[test]
    fn test_decoded_image_dropped_after_materialization() {
        let picker = test_picker();
        let slot = ImageSlot::new();
        let mut state = ImageViewState::new(slot.clone());

        let image = test_image();
        slot.fulfill(image.clone());

        let _ = render_frame(&mut state, &picker, Tint::opaque());
        assert!(state.is_materialized());

        // The slot released its reference; only the test's handle remains.
        assert_eq!(Arc::strong_count(&image), 1);
    }

    #[test]
    fn test_materialized_view_never_polls_slot_again() {
        let picker = test_picker();
        let slot = ImageSlot::new();
        let mut state = ImageViewState::new(slot.clone());

        slot.fulfill(test_image());
        let _ = render_frame(&mut state, &picker, Tint::opaque());
        assert_eq!(slot.poll(), SlotPoll::Claimed);

        // Further frames draw from the protocol; the claimed slot stays
        // untouched and the view remains materialized.
        let _ = render_frame(&mut state, &picker, Tint::opaque());
        let _ = render_frame(&mut state, &picker, Tint::opaque());
        assert!(state.is_materialized());
        assert_eq!(slot.poll(), SlotPoll::Claimed);
    }

    #[test]
    fn test_transparent_tint_skips_all_work() {
        let picker = test_picker();
        let slot = ImageSlot::new();
        let mut state = ImageViewState::new(slot.clone());

        slot.fulfill(test_image());

        let buf = render_frame(&mut state, &picker, Tint::transparent());

        // Nothing drawn, nothing materialized, slot untouched.
        assert_eq!(buffer_text(&buf).trim(), "");
        assert!(!state.is_materialized());
        assert_eq!(slot.poll(), SlotPoll::Ready);
    }

    #[test]
    fn test_reset_releases_protocol_and_restarts() {
        let picker = test_picker();
        let slot = ImageSlot::new();
        let mut state = ImageViewState::new(slot.clone());

        slot.fulfill(test_image());
        let _ = render_frame(&mut state, &picker, Tint::opaque());
        assert!(state.is_materialized());

        state.reset(ImageSlot::new());
        assert!(!state.is_materialized());
        assert!(state.status().is_pending());

        let buf = render_frame(&mut state, &picker, Tint::opaque());
        assert!(buffer_text(&buf).contains(PLACEHOLDER_CAPTION));
    }
}
