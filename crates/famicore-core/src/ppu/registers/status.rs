use bitflags::bitflags;

bitflags! {
    /// PPU status register (`$2002`).
    ///
    /// Bits 0-4 are open bus on hardware; only the top three bits carry
    /// state. Reading the register clears the VBlank flag and the shared
    /// `w` write toggle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Status: u8 {
        /// Sprite overflow flag (bit 5).
        const SPRITE_OVERFLOW = 0b0010_0000;
        /// Sprite zero hit flag (bit 6).
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Vertical blank flag (bit 7).
        const VERTICAL_BLANK = 0b1000_0000;
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::empty()
    }
}
