use bitflags::bitflags;

bitflags! {
    /// OAM byte 2: sprite attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct SpriteAttributes: u8 {
        /// Palette select (sprite palettes 4-7).
        const PALETTE = 0b0000_0011;
        /// Draw behind the background when set.
        const PRIORITY_BEHIND_BACKGROUND = 0b0010_0000;
        /// Horizontal flip.
        const FLIP_HORIZONTAL = 0b0100_0000;
        /// Vertical flip.
        const FLIP_VERTICAL = 0b1000_0000;
    }
}
