//! iNES header parsing.
//!
//! Only the iNES-defined fields (bytes 0..=7) are interpreted. Images that
//! advertise NES 2.0 are accepted, but the extended sizing/submapper fields
//! are ignored and the cartridge behaves like its iNES 1.0 reading.

use bitflags::bitflags;

/// Length of the iNES header in bytes.
pub const NES_HEADER_LEN: usize = 16;
/// Magic prefix: `NES` followed by an MS-DOS EOF byte.
pub const NES_MAGIC: &[u8; 4] = b"NES\x1A";

/// PRG-ROM unit advertised by header byte 4 (16 KiB).
pub const PRG_ROM_UNIT: usize = 16 * 1024;
/// CHR-ROM unit advertised by header byte 5 (8 KiB).
pub const CHR_ROM_UNIT: usize = 8 * 1024;
/// CHR-RAM allocated when the header advertises no CHR-ROM.
pub const CHR_RAM_SIZE: usize = 8 * 1024;
/// PRG-RAM window size mapped at `$6000-$7FFF`.
pub const PRG_RAM_SIZE: usize = 8 * 1024;
/// Trainer block size when flags 6 bit 2 is set.
pub const TRAINER_LEN: usize = 512;

bitflags! {
    /// iNES flags 6: mirroring, battery, trainer, four-screen, mapper low nibble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const MIRRORING       = 0b0000_0001;
        const BATTERY         = 0b0000_0010;
        const TRAINER         = 0b0000_0100;
        const FOUR_SCREEN     = 0b0000_1000;
        const MAPPER_LOW_MASK = 0b1111_0000;
    }
}

bitflags! {
    /// iNES flags 7: console type, header format, mapper high nibble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const VS_UNISYSTEM     = 0b0000_0001;
        const PLAYCHOICE_10    = 0b0000_0010;
        const FORMAT_MASK      = 0b0000_1100;
        const MAPPER_HIGH_MASK = 0b1111_0000;
    }
}

/// Header flavour detected from flags 7 bits 2-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomFormat {
    /// Plain iNES 1.0.
    INes,
    /// NES 2.0 (extended fields present but not consumed here).
    Nes20,
}

impl RomFormat {
    fn from_flags7(flags7: Flags7) -> Self {
        if flags7.bits() & 0x0C == 0x08 {
            RomFormat::Nes20
        } else {
            RomFormat::INes
        }
    }
}

/// Layout mirroring type for the PPU nametables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirroring {
    /// Two horizontal nametables that mirror vertically.
    Horizontal,
    /// Two vertical nametables that mirror horizontally.
    Vertical,
    /// Cartridge supplies its own four nametables.
    FourScreen,
    /// Single-screen mirroring using the first nametable (`$2000` region).
    SingleScreenLower,
    /// Single-screen mirroring using the second nametable (`$2400` region).
    SingleScreenUpper,
}

/// Parsed iNES header fields consumed by the rest of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub format: RomFormat,
    /// Mapper id assembled from flags 7 high nibble | flags 6 high nibble.
    pub mapper: u16,
    /// Initial nametable mirroring advertised by the cartridge.
    pub mirroring: Mirroring,
    /// Battery bit: the cartridge keeps PRG-RAM contents when powered off.
    pub battery_backed_ram: bool,
    /// A 512-byte trainer block sits between the header and PRG data.
    pub trainer_present: bool,
    /// PRG-ROM size in bytes.
    pub prg_rom_size: usize,
    /// CHR-ROM size in bytes. Zero means the board carries CHR-RAM instead.
    pub chr_rom_size: usize,
    /// CHR-RAM size in bytes (allocated only when there is no CHR-ROM).
    pub chr_ram_size: usize,
    /// PRG-RAM window size in bytes.
    pub prg_ram_size: usize,
}

impl Header {
    /// Parse a header from the first 16 bytes of an iNES image.
    ///
    /// The caller has already verified length and magic (see
    /// [`crate::cartridge::Cartridge::new`]); this only interprets fields.
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        let flags6 = Flags6::from_bits_truncate(bytes[6]);
        let flags7 = Flags7::from_bits_truncate(bytes[7]);

        let mapper = u16::from((flags7.bits() & 0xF0) | (flags6.bits() >> 4));
        let mirroring = resolve_mirroring(flags6);

        let chr_rom_size = bytes[5] as usize * CHR_ROM_UNIT;
        let chr_ram_size = if chr_rom_size == 0 { CHR_RAM_SIZE } else { 0 };

        Self {
            format: RomFormat::from_flags7(flags7),
            mapper,
            mirroring,
            battery_backed_ram: flags6.contains(Flags6::BATTERY),
            trainer_present: flags6.contains(Flags6::TRAINER),
            prg_rom_size: bytes[4] as usize * PRG_ROM_UNIT,
            chr_rom_size,
            chr_ram_size,
            prg_ram_size: PRG_RAM_SIZE,
        }
    }
}

/// Four-screen takes precedence over the horizontal/vertical bit.
fn resolve_mirroring(flags6: Flags6) -> Mirroring {
    if flags6.contains(Flags6::FOUR_SCREEN) {
        Mirroring::FourScreen
    } else if flags6.contains(Flags6::MIRRORING) {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    }
}
