//! Cartridge loading: iNES image parsing plus mapper construction.

use std::{fs, path::Path};

use tracing::info;

use crate::{
    cartridge::header::{Header, Mirroring, NES_HEADER_LEN, NES_MAGIC, TRAINER_LEN},
    error::Error,
    reset_kind::ResetKind,
};

pub mod header;
pub mod mapper;

pub use mapper::Mapper;

/// Owned PRG-ROM image handed to a mapper.
pub type PrgRom = Box<[u8]>;
/// Owned CHR-ROM image handed to a mapper (empty when the board is CHR-RAM).
pub type ChrRom = Box<[u8]>;
/// Optional 512-byte trainer block.
pub type TrainerBytes = Option<Box<[u8; TRAINER_LEN]>>;

/// A parsed cartridge: header metadata plus the board logic behind it.
///
/// All CPU/PPU traffic into cartridge space funnels through this type, which
/// simply forwards to the boxed [`Mapper`].
#[derive(Debug)]
pub struct Cartridge {
    header: Header,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Parse an iNES image from an in-memory byte slice and construct the
    /// board it describes.
    pub fn new(bytes: &[u8]) -> Result<Self, Error> {
        let header_bytes = bytes.get(..NES_HEADER_LEN).ok_or(Error::RomTooShort {
            actual: bytes.len(),
        })?;
        if &header_bytes[..4] != NES_MAGIC {
            return Err(Error::InvalidMagic);
        }
        let header = Header::from_bytes(header_bytes);

        let mut cursor = NES_HEADER_LEN;
        let trainer: TrainerBytes = if header.trainer_present {
            let slice = section(bytes, &mut cursor, TRAINER_LEN, "trainer")?;
            let mut block = Box::new([0u8; TRAINER_LEN]);
            block.copy_from_slice(slice);
            Some(block)
        } else {
            None
        };

        let prg_rom: PrgRom = section(bytes, &mut cursor, header.prg_rom_size, "PRG ROM")?.into();
        let chr_rom: ChrRom = section(bytes, &mut cursor, header.chr_rom_size, "CHR ROM")?.into();

        let mapper = mapper::build(header, prg_rom, chr_rom, trainer)?;
        info!(
            mapper = header.mapper,
            board = %mapper.name(),
            prg_kib = header.prg_rom_size / 1024,
            chr_kib = header.chr_rom_size.max(header.chr_ram_size) / 1024,
            "cartridge loaded"
        );

        Ok(Self { header, mapper })
    }

    /// Load and parse a cartridge directly from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let bytes = fs::read(path)?;
        Self::new(&bytes)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    pub fn reset(&mut self, kind: ResetKind) {
        self.mapper.reset(kind);
    }

    /// CPU read in cartridge space (`$4020-$FFFF`). Unmapped bytes read 0.
    pub fn cpu_read(&self, addr: u16) -> u8 {
        self.mapper.cpu_read(addr).unwrap_or(0)
    }

    /// CPU write in cartridge space. `cpu_cycle` feeds boards that filter
    /// back-to-back writes (MMC1).
    pub fn cpu_write(&mut self, addr: u16, data: u8, cpu_cycle: u64) {
        self.mapper.cpu_write(addr, data, cpu_cycle);
    }

    /// PPU read in pattern-table space (`$0000-$1FFF`).
    pub fn ppu_read(&self, addr: u16) -> u8 {
        self.mapper.ppu_read(addr)
    }

    /// PPU write in pattern-table space (stores on CHR-RAM boards only).
    pub fn ppu_write(&mut self, addr: u16, data: u8) {
        self.mapper.ppu_write(addr, data);
    }

    /// Current nametable mirroring (boards may override the header value).
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    /// Scanline clock delivered by the PPU at dot 260 of rendering lines.
    pub fn tick_scanline(&mut self) {
        self.mapper.tick_scanline();
    }

    /// Level of the cartridge IRQ line.
    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }
}

fn section<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    name: &'static str,
) -> Result<&'a [u8], Error> {
    if len == 0 {
        return Ok(&[]);
    }

    let end = cursor.checked_add(len).ok_or(Error::SectionTooShort {
        section: name,
        expected: len,
        actual: bytes.len().saturating_sub(*cursor),
    })?;

    let slice = bytes.get(*cursor..end).ok_or(Error::SectionTooShort {
        section: name,
        expected: len,
        actual: bytes.len().saturating_sub(*cursor),
    })?;

    *cursor = end;
    Ok(slice)
}
