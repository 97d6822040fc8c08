//! CHR storage helper shared by the simple boards.
//!
//! A board exposes either CHR-ROM or CHR-RAM to the PPU. Wrapping the two in
//! one enum lets mappers share the address decoding instead of re-implementing
//! it per board.

use crate::cartridge::header::Header;

/// PPU-side CHR storage.
#[derive(Debug, Clone)]
pub enum ChrStorage {
    /// CHR backed by read-only ROM data from the cartridge image.
    Rom(Box<[u8]>),
    /// CHR backed by writable RAM located on the cartridge.
    Ram(Box<[u8]>),
}

impl ChrStorage {
    /// Read a byte from CHR space, applying 8 KiB mirroring.
    pub fn read(&self, addr: u16) -> u8 {
        self.read_indexed(0, (addr as usize) & 0x1FFF)
    }

    /// Write a byte to CHR RAM, if present. Writes to ROM are ignored.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.write_indexed(0, (addr as usize) & 0x1FFF, data);
    }

    /// Read a byte from an explicitly indexed CHR window.
    ///
    /// `base` and `offset` form an absolute index into the CHR space and are
    /// wrapped to the underlying length; mappers with finer banking (1 KiB
    /// pages on MMC3) use this directly.
    pub fn read_indexed(&self, base: usize, offset: usize) -> u8 {
        let mem = match self {
            ChrStorage::Rom(rom) => rom,
            ChrStorage::Ram(ram) => ram,
        };
        if mem.is_empty() {
            return 0;
        }
        mem[(base + offset) % mem.len()]
    }

    /// Write a byte to an explicitly indexed CHR window, if CHR RAM is present.
    pub fn write_indexed(&mut self, base: usize, offset: usize, data: u8) {
        if let ChrStorage::Ram(ram) = self {
            if !ram.is_empty() {
                let len = ram.len();
                ram[(base + offset) % len] = data;
            }
        }
    }
}

/// Construct the [`ChrStorage`] the header describes: ROM when the image has
/// CHR data, otherwise a zeroed CHR-RAM block.
pub fn select_chr_storage(header: &Header, chr_rom: Box<[u8]>) -> ChrStorage {
    if header.chr_rom_size > 0 {
        ChrStorage::Rom(chr_rom)
    } else {
        ChrStorage::Ram(vec![0; header.chr_ram_size].into_boxed_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_ignores_writes() {
        let mut chr = ChrStorage::Rom(vec![7u8; 0x2000].into_boxed_slice());
        chr.write(0x0100, 0xAB);
        assert_eq!(chr.read(0x0100), 7);
    }

    #[test]
    fn ram_round_trips() {
        let mut chr = ChrStorage::Ram(vec![0u8; 0x2000].into_boxed_slice());
        chr.write(0x1FFF, 0xAB);
        assert_eq!(chr.read(0x1FFF), 0xAB);
    }

    #[test]
    fn indexed_access_wraps_to_length() {
        let chr = ChrStorage::Rom((0u8..=255).collect::<Vec<_>>().into_boxed_slice());
        assert_eq!(chr.read_indexed(256, 5), 5);
    }
}
