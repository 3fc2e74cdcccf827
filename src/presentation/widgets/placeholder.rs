//! Static substitute graphics shown while pending or after failure.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

/// Glyph shown while an image is still resolving.
pub const PLACEHOLDER_GLYPH: &str = "▒▒";
/// Caption shown while an image is still resolving.
pub const PLACEHOLDER_CAPTION: &str = "loading";

/// Glyph shown after an image permanently failed to resolve.
pub const FALLBACK_GLYPH: &str = "✕";
/// Caption shown after an image permanently failed to resolve.
pub const FALLBACK_CAPTION: &str = "image unavailable";

/// Static placeholder drawn every frame until the image resolves.
#[derive(Debug, Clone, Copy)]
pub struct Placeholder {
    color: Color,
}

impl Placeholder {
    /// Creates a placeholder in the default color.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            color: Color::DarkGray,
        }
    }

    /// Sets the draw color.
    #[must_use]
    pub const fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Placeholder {
    fn render(self, area: Rect, buf: &mut Buffer) {
        draw_centered(
            area,
            buf,
            PLACEHOLDER_GLYPH,
            PLACEHOLDER_CAPTION,
            Style::default().fg(self.color),
        );
    }
}

/// Static fallback drawn every frame after a permanent failure.
#[derive(Debug, Clone, Copy)]
pub struct Fallback {
    color: Color,
}

impl Fallback {
    /// Creates a fallback in the default color.
    #[must_use]
    pub const fn new() -> Self {
        Self { color: Color::Red }
    }

    /// Sets the draw color.
    #[must_use]
    pub const fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Default for Fallback {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Fallback {
    fn render(self, area: Rect, buf: &mut Buffer) {
        draw_centered(
            area,
            buf,
            FALLBACK_GLYPH,
            FALLBACK_CAPTION,
            Style::default().fg(self.color).add_modifier(Modifier::DIM),
        );
    }
}

/// Draws a glyph with a caption underneath, centered in the area.
/// Degrades to glyph-only when the area is a single row.
fn draw_centered(area: Rect, buf: &mut Buffer, glyph: &str, caption: &str, style: Style) {
    if area.is_empty() {
        return;
    }

    let glyph_line = Line::styled(glyph.to_string(), style);
    let caption_line = Line::styled(caption.to_string(), style);

    if area.height == 1 {
        render_line(&glyph_line, glyph, area, area.y, buf);
        return;
    }

    let mid = area.y + area.height / 2;
    render_line(&glyph_line, glyph, area, mid.saturating_sub(1), buf);
    if caption.width() <= area.width as usize {
        render_line(&caption_line, caption, area, mid, buf);
    }
}

fn render_line(line: &Line<'_>, content: &str, area: Rect, y: u16, buf: &mut Buffer) {
    let width = u16::try_from(content.width()).unwrap_or(area.width);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let row = Rect::new(x, y, width.min(area.width), 1);
    line.render(row, buf);
}
