//! Shared definitions for the NES memory map.
//!
//! Centralizing address-related constants keeps the hardware layout in one
//! location and makes it easier to reference the console documentation while
//! reading the rest of the code base.

/// CPU memory map details.
pub mod cpu {
    /// First address of internal RAM.
    pub const INTERNAL_RAM_START: u16 = 0x0000;
    /// Internal RAM size in bytes (2 KiB, mirrored up to `$1FFF`).
    pub const INTERNAL_RAM_SIZE: usize = 0x0800;
    /// Mask for decoding internal RAM mirrors.
    pub const INTERNAL_RAM_MASK: u16 = 0x07FF;
    /// Last address of the mirrored internal RAM window.
    pub const INTERNAL_RAM_MIRROR_END: u16 = 0x1FFF;

    /// First address of the hardware stack page.
    pub const STACK_PAGE_START: u16 = 0x0100;

    /// Controller port 1 (`$4016`).
    pub const CONTROLLER_PORT_1: u16 = 0x4016;
    /// Controller port 2 (`$4017`, shared with the APU frame counter write).
    pub const CONTROLLER_PORT_2: u16 = 0x4017;

    /// First address decoded by the cartridge (expansion space onward).
    pub const CARTRIDGE_SPACE_START: u16 = 0x4020;
    /// First address of the PRG-RAM window.
    pub const PRG_RAM_START: u16 = 0x6000;
    /// Last address of the PRG-RAM window.
    pub const PRG_RAM_END: u16 = 0x7FFF;
    /// First address of the PRG-ROM window.
    pub const PRG_ROM_START: u16 = 0x8000;
    /// Last CPU address.
    pub const CPU_ADDR_END: u16 = 0xFFFF;

    /// NMI vector (`$FFFA/$FFFB`).
    pub const NMI_VECTOR_LO: u16 = 0xFFFA;
    pub const NMI_VECTOR_HI: u16 = 0xFFFB;
    /// Reset vector (`$FFFC/$FFFD`).
    pub const RESET_VECTOR_LO: u16 = 0xFFFC;
    pub const RESET_VECTOR_HI: u16 = 0xFFFD;
    /// IRQ/BRK vector (`$FFFE/$FFFF`).
    pub const IRQ_VECTOR_LO: u16 = 0xFFFE;
    pub const IRQ_VECTOR_HI: u16 = 0xFFFF;
}

/// PPU register layout and VRAM mirror rules.
pub mod ppu {
    /// First CPU-visible PPU register address.
    pub const REGISTER_BASE: u16 = 0x2000;
    /// Last address of the mirrored PPU register window.
    pub const REGISTER_MIRROR_END: u16 = 0x3FFF;
    /// Mask for decoding register mirrors (`addr & 0x0007`).
    pub const REGISTER_SELECT_MASK: u16 = 0x0007;

    /// Address mask applied to every picture-bus access (wraps mod `$4000`).
    pub const VRAM_MIRROR_MASK: u16 = 0x3FFF;

    /// Palette RAM base address (`$3F00`).
    pub const PALETTE_BASE: u16 = 0x3F00;
    /// Palette RAM byte count (mirrored every 32 bytes up to `$3FFF`).
    pub const PALETTE_RAM_SIZE: usize = 0x20;

    /// Base address of nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Size of a single nametable in bytes.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Physical nametable RAM: four 1 KiB tables (the upper two are only
    /// reachable on four-screen cartridges).
    pub const NAMETABLE_RAM_SIZE: usize = 0x1000;

    /// Pattern table base address for table 0.
    pub const PATTERN_TABLE_0: u16 = 0x0000;
    /// Pattern table base address for table 1.
    pub const PATTERN_TABLE_1: u16 = 0x1000;
    /// Last pattern-table address (cartridge CHR space).
    pub const PATTERN_TABLE_END: u16 = 0x1FFF;

    /// DMA register used for transferring OAM data (`$4014`).
    pub const OAM_DMA: u16 = 0x4014;
    /// Primary OAM size: 64 sprites of 4 bytes.
    pub const OAM_RAM_SIZE: usize = 0x100;
    /// Secondary OAM size: 8 sprites of 4 bytes.
    pub const SECONDARY_OAM_RAM_SIZE: usize = 0x20;

    /// CPU-visible PPU register identifiers.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `$2000` - PPUCTRL
        Control = 0x2000,
        /// `$2001` - PPUMASK
        Mask = 0x2001,
        /// `$2002` - PPUSTATUS
        Status = 0x2002,
        /// `$2003` - OAMADDR
        OamAddr = 0x2003,
        /// `$2004` - OAMDATA
        OamData = 0x2004,
        /// `$2005` - PPUSCROLL
        Scroll = 0x2005,
        /// `$2006` - PPUADDR
        Addr = 0x2006,
        /// `$2007` - PPUDATA
        Data = 0x2007,
    }

    impl Register {
        /// Raw address backing the register.
        pub const fn addr(self) -> u16 {
            self as u16
        }

        /// Resolves the canonical register for a CPU address in `$2000-$3FFF`.
        pub const fn from_cpu_addr(addr: u16) -> Self {
            match addr & REGISTER_SELECT_MASK {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            }
        }
    }
}

/// Audio Processing Unit (APU) register layout.
pub mod apu {
    /// Start of the CPU-mapped APU register range.
    pub const REGISTER_BASE: u16 = 0x4000;
    /// Final channel register before the DMA and controller bridges.
    pub const CHANNEL_REGISTER_END: u16 = 0x4013;
    /// Address of the status register (`$4015`).
    pub const STATUS: u16 = 0x4015;
    /// Address of the frame counter configuration register (`$4017`).
    pub const FRAME_COUNTER: u16 = 0x4017;
    /// Total number of addresses exposed by the APU.
    pub const REGISTER_SPACE: usize = (FRAME_COUNTER - REGISTER_BASE + 1) as usize;
}
