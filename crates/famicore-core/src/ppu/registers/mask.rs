use bitflags::bitflags;

bitflags! {
    /// PPU mask register (`$2001`).
    ///
    /// Controls grayscale mode, the left-column enables, layer visibility,
    /// and the color emphasis outputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Mask: u8 {
        /// Grayscale conversion enable (bit 0).
        const GRAYSCALE = 0b0000_0001;
        /// Show background in the leftmost eight pixels (bit 1).
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        /// Show sprites in the leftmost eight pixels (bit 2).
        const SHOW_SPRITES_LEFT = 0b0000_0100;
        /// Enables background rendering (bit 3).
        const SHOW_BACKGROUND = 0b0000_1000;
        /// Enables sprite rendering (bit 4).
        const SHOW_SPRITES = 0b0001_0000;
        /// Color emphasis outputs (bits 5-7).
        const EMPHASIZE_RED = 0b0010_0000;
        const EMPHASIZE_GREEN = 0b0100_0000;
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::empty()
    }
}

impl Mask {
    /// Returns `true` when either background or sprite rendering is enabled.
    pub(crate) fn rendering_enabled(self) -> bool {
        self.intersects(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
    }
}
