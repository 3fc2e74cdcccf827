//! Terminal graphics protocol selection.

use ratatui_image::picker::{Picker, ProtocolType};

use crate::infrastructure::config::ProtocolMode;

/// Wraps the protocol picker with the viewer's selection policy.
pub struct ProtocolSelector {
    picker: Picker,
}

impl ProtocolSelector {
    /// Queries the terminal and picks the best protocol it supports,
    /// falling back to half-blocks when the query fails.
    #[must_use]
    pub fn from_terminal() -> Self {
        let mut picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::halfblocks());

        let caps = picker.capabilities();
        let has_sixel = caps
            .iter()
            .any(|c| matches!(c, ratatui_image::picker::Capability::Sixel));
        let has_kitty = caps
            .iter()
            .any(|c| matches!(c, ratatui_image::picker::Capability::Kitty));

        // Some terminals advertise sixel but the stdio query still lands on
        // half-blocks; prefer the pixel protocol when it is there.
        if has_sixel && !has_kitty && picker.protocol_type() == ProtocolType::Halfblocks {
            picker.set_protocol_type(ProtocolType::Sixel);
        }

        Self { picker }
    }

    /// Builds a selector for the given mode.
    #[must_use]
    pub fn new(mode: ProtocolMode) -> Self {
        match mode {
            ProtocolMode::Auto => Self::from_terminal(),
            ProtocolMode::Halfblocks => Self::halfblocks(),
            ProtocolMode::Sixel => Self::forced(ProtocolType::Sixel),
            ProtocolMode::Kitty => Self::forced(ProtocolType::Kitty),
            ProtocolMode::Iterm2 => Self::forced(ProtocolType::Iterm2),
        }
    }

    /// Cell-based half-block rendering. Works headless; used in tests.
    #[must_use]
    pub fn halfblocks() -> Self {
        Self {
            picker: Picker::halfblocks(),
        }
    }

    fn forced(protocol: ProtocolType) -> Self {
        let mut picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::halfblocks());
        picker.set_protocol_type(protocol);
        Self { picker }
    }

    /// Returns the selected protocol type.
    #[must_use]
    pub fn protocol_type(&self) -> ProtocolType {
        self.picker.protocol_type()
    }

    /// Returns the underlying picker.
    #[must_use]
    pub const fn picker(&self) -> &Picker {
        &self.picker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halfblocks_selector() {
        let selector = ProtocolSelector::halfblocks();
        assert_eq!(selector.protocol_type(), ProtocolType::Halfblocks);
    }
}
