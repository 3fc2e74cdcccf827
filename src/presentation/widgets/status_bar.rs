//! Status bar widget for the viewer.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::domain::entities::ImageStatus;
use crate::infrastructure::image::CacheStats;

/// One-line status bar: resolve state on the left, cache statistics and
/// protocol name on the right.
#[derive(Debug, Clone)]
pub struct StatusBar {
    status: ImageStatus,
    native_size: Option<(u32, u32)>,
    cache: Option<CacheStats>,
    protocol: String,
}

impl StatusBar {
    /// Creates a status bar for the current entry.
    #[must_use]
    pub fn new(status: ImageStatus, protocol: impl Into<String>) -> Self {
        Self {
            status,
            native_size: None,
            cache: None,
            protocol: protocol.into(),
        }
    }

    /// Sets the native image dimensions.
    #[must_use]
    pub const fn native_size(mut self, size: Option<(u32, u32)>) -> Self {
        self.native_size = size;
        self
    }

    /// Sets cache statistics.
    #[must_use]
    pub fn cache(mut self, stats: Option<CacheStats>) -> Self {
        self.cache = stats;
        self
    }

    fn status_span(&self) -> Span<'static> {
        match &self.status {
            ImageStatus::Pending => {
                Span::styled("resolving…", Style::default().fg(Color::Yellow))
            }
            ImageStatus::Ready => {
                let label = self
                    .native_size
                    .map_or_else(|| "ready".to_string(), |(w, h)| format!("{w}×{h}"));
                Span::styled(label, Style::default().fg(Color::Green))
            }
            ImageStatus::Failed(reason) => Span::styled(
                format!("failed: {reason}"),
                Style::default().fg(Color::Red),
            ),
        }
    }
}

impl Widget for StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let left = Line::from(vec![Span::raw(" "), self.status_span()]);

        let mut right_parts = Vec::new();
        if let Some(stats) = &self.cache {
            right_parts.push(stats.to_string());
        }
        right_parts.push(self.protocol.clone());
        let right_text = format!("{} ", right_parts.join(" · "));
        let right = Line::styled(
            right_text,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        )
        .right_aligned();

        left.render(area, buf);
        right.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for x in 0..buf.area.width {
            out.push_str(buf[(x, 0)].symbol());
        }
        out
    }

    #[test]
    fn test_ready_shows_dimensions() {
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(ImageStatus::Ready, "sixel")
            .native_size(Some((640, 480)))
            .render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("640×480"));
        assert!(text.contains("sixel"));
    }

    #[test]
    fn test_failed_shows_reason() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(ImageStatus::Failed("Network error: 404".into()), "halfblocks")
            .render(area, &mut buf);

        assert!(buffer_text(&buf).contains("failed: Network error: 404"));
    }

    #[test]
    fn test_pending_shows_resolving() {
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(ImageStatus::Pending, "kitty").render(area, &mut buf);

        assert!(buffer_text(&buf).contains("resolving"));
    }
}
