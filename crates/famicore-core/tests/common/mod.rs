#![allow(dead_code)]

//! Shared iNES image builders for the integration tests.

/// Builds iNES images from in-memory PRG/CHR contents.
///
/// PRG placement comes in two flavours: raw image offsets, and "top of
/// address space" placement for code and vectors that live in the fixed
/// last bank every supported board keeps at `$FFFF`.
pub struct RomBuilder {
    mapper: u8,
    vertical_mirroring: bool,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl RomBuilder {
    /// Starts from zero-filled PRG/CHR of the given bank counts. A CHR bank
    /// count of zero produces a CHR-RAM board.
    pub fn new(prg_banks_16k: u8, chr_banks_8k: u8) -> Self {
        Self {
            mapper: 0,
            vertical_mirroring: false,
            prg: vec![0; usize::from(prg_banks_16k) * 16 * 1024],
            chr: vec![0; usize::from(chr_banks_8k) * 8 * 1024],
        }
    }

    pub fn mapper(mut self, mapper: u8) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn vertical_mirroring(mut self) -> Self {
        self.vertical_mirroring = true;
        self
    }

    /// Writes bytes at a raw offset into the PRG image.
    pub fn prg_raw(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.prg[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Writes bytes at a CPU address inside the fixed top window: the image
    /// tail is what the console sees at `$FFFF` downward on every supported
    /// board's power-on banking.
    pub fn prg_at_top(self, cpu_addr: u16, bytes: &[u8]) -> Self {
        let from_top = 0x1_0000 - usize::from(cpu_addr);
        let offset = self.prg.len() - from_top;
        self.prg_raw(offset, bytes)
    }

    /// Sets one of the `$FFFA/$FFFC/$FFFE` vectors.
    pub fn vector(self, vector_addr: u16, target: u16) -> Self {
        self.prg_at_top(vector_addr, &target.to_le_bytes())
    }

    /// Fills a CHR tile (16 bytes) with the given bitplane byte pair.
    pub fn chr_tile(mut self, tile: usize, low: u8, high: u8) -> Self {
        let base = tile * 16;
        self.chr[base..base + 8].fill(low);
        self.chr[base + 8..base + 16].fill(high);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut flags6 = (self.mapper << 4) & 0xF0;
        if self.vertical_mirroring {
            flags6 |= 0x01;
        }
        let flags7 = self.mapper & 0xF0;

        let mut rom = vec![
            b'N',
            b'E',
            b'S',
            0x1A,
            (self.prg.len() / (16 * 1024)) as u8,
            (self.chr.len() / (8 * 1024)) as u8,
            flags6,
            flags7,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
        ];
        rom.extend_from_slice(&self.prg);
        rom.extend_from_slice(&self.chr);
        rom
    }
}

/// A 32 KiB mapper-0 image with `program` at `$8000` and the reset vector
/// pointing there.
pub fn nrom_with_program(program: &[u8]) -> RomBuilder {
    RomBuilder::new(2, 1)
        .prg_raw(0, program)
        .vector(0xFFFC, 0x8000)
}
