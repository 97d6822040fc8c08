//! Mapper trait, board registry, and helpers shared by the concrete boards.

use std::borrow::Cow;
use std::fmt::Debug;

use crate::{
    cartridge::{
        header::{Header, Mirroring},
        ChrRom, PrgRom, TrainerBytes,
    },
    error::Error,
    reset_kind::ResetKind,
};

mod chr_storage;
mod mapper0;
mod mapper1;
mod mapper2;
mod mapper3;
mod mapper4;
mod mapper7;
mod mapper11;
mod mapper66;

pub use chr_storage::{select_chr_storage, ChrStorage};
pub use mapper0::Mapper0;
pub use mapper1::Mapper1;
pub use mapper2::Mapper2;
pub use mapper3::Mapper3;
pub use mapper4::Mapper4;
pub use mapper7::Mapper7;
pub use mapper11::Mapper11;
pub use mapper66::Mapper66;

/// Cartridge board logic: address translation, bank switching, and the
/// optional scanline IRQ.
///
/// `cpu_read` returns `None` for addresses the board does not decode so the
/// bus can fall back to open-bus behaviour (here: zero).
pub trait Mapper: Debug {
    /// Power-on / soft-reset hook. Most boards only care about power-on.
    fn reset(&mut self, kind: ResetKind) {
        let _ = kind;
    }

    /// CPU read in `$4020-$FFFF`.
    fn cpu_read(&self, addr: u16) -> Option<u8>;

    /// CPU write in `$4020-$FFFF`. `cpu_cycle` is the CPU cycle counter at
    /// the time of the write; boards that filter back-to-back serial writes
    /// (MMC1) compare against it.
    fn cpu_write(&mut self, addr: u16, data: u8, cpu_cycle: u64);

    /// PPU read in `$0000-$1FFF`.
    fn ppu_read(&self, addr: u16) -> u8;

    /// PPU write in `$0000-$1FFF` (stores only on CHR-RAM boards).
    fn ppu_write(&mut self, addr: u16, data: u8);

    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;

    /// Scanline clock: the PPU calls this at dot 260 of every rendering
    /// line while rendering is enabled. Only MMC3 reacts.
    fn tick_scanline(&mut self) {}

    /// Level of the board's IRQ line (level-sensitive; acknowledged through
    /// the board's own registers, not by the CPU taking the interrupt).
    fn irq_pending(&self) -> bool {
        false
    }

    /// iNES mapper id this board implements.
    fn mapper_id(&self) -> u16;

    /// Human-readable board name for logs.
    fn name(&self) -> Cow<'static, str>;
}

/// Construct the board for the header's mapper id.
pub(crate) fn build(
    header: Header,
    prg_rom: PrgRom,
    chr_rom: ChrRom,
    trainer: TrainerBytes,
) -> Result<Box<dyn Mapper>, Error> {
    if prg_rom.is_empty() {
        return Err(Error::MapperFault("cartridge has no PRG-ROM"));
    }

    let mapper: Box<dyn Mapper> = match header.mapper {
        0 => Box::new(Mapper0::new(header, prg_rom, chr_rom, trainer)),
        1 => Box::new(Mapper1::new(header, prg_rom, chr_rom, trainer)),
        2 => Box::new(Mapper2::new(header, prg_rom, chr_rom, trainer)),
        3 => Box::new(Mapper3::new(header, prg_rom, chr_rom, trainer)),
        4 => Box::new(Mapper4::new(header, prg_rom, chr_rom, trainer)),
        7 => Box::new(Mapper7::new(header, prg_rom, chr_rom)),
        11 => Box::new(Mapper11::new(header, prg_rom, chr_rom)),
        66 => Box::new(Mapper66::new(header, prg_rom, chr_rom, trainer)),
        id => return Err(Error::UnsupportedMapper(id)),
    };

    Ok(mapper)
}

/// Allocate the PRG-RAM window, seeding the trainer block at `$7000` when
/// the image carries one.
pub(crate) fn allocate_prg_ram_with_trainer(header: &Header, trainer: TrainerBytes) -> Box<[u8]> {
    let mut prg_ram = vec![0u8; header.prg_ram_size].into_boxed_slice();
    if let Some(block) = trainer {
        // Trainer data loads at $7000, i.e. offset $1000 into the window.
        let offset = 0x1000;
        if prg_ram.len() >= offset + block.len() {
            prg_ram[offset..offset + block.len()].copy_from_slice(block.as_ref());
        }
    }
    prg_ram
}
