//! Mapper 0 – NROM: no banking at all.
//!
//! - CPU `$6000-$7FFF`: optional PRG-RAM (family BASIC boards).
//! - CPU `$8000-$FFFF`: 16 or 32 KiB PRG-ROM; a 16 KiB image mirrors the
//!   single bank into both halves.
//! - PPU `$0000-$1FFF`: 8 KiB CHR ROM or RAM.

use std::borrow::Cow;

use crate::{
    cartridge::{
        header::{Header, Mirroring},
        mapper::{allocate_prg_ram_with_trainer, select_chr_storage, ChrStorage},
        ChrRom, PrgRom, TrainerBytes,
    },
    memory::cpu as cpu_mem,
};

#[derive(Debug)]
pub struct Mapper0 {
    prg_rom: PrgRom,
    prg_ram: Box<[u8]>,
    chr: ChrStorage,
    mirroring: Mirroring,
}

impl Mapper0 {
    pub fn new(header: Header, prg_rom: PrgRom, chr_rom: ChrRom, trainer: TrainerBytes) -> Self {
        Self {
            prg_rom,
            prg_ram: allocate_prg_ram_with_trainer(&header, trainer),
            chr: select_chr_storage(&header, chr_rom),
            mirroring: header.mirroring,
        }
    }

    fn read_prg_rom(&self, addr: u16) -> u8 {
        let offset = (addr - cpu_mem::PRG_ROM_START) as usize % self.prg_rom.len();
        self.prg_rom[offset]
    }
}

impl super::Mapper for Mapper0 {
    fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => {
                let idx = (addr - cpu_mem::PRG_RAM_START) as usize % self.prg_ram.len();
                Some(self.prg_ram[idx])
            }
            cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END => Some(self.read_prg_rom(addr)),
            _ => None,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8, _cpu_cycle: u64) {
        if let cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END = addr {
            let idx = (addr - cpu_mem::PRG_RAM_START) as usize % self.prg_ram.len();
            self.prg_ram[idx] = data;
        }
        // PRG-ROM writes have no effect on this board.
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        self.chr.read(addr)
    }

    fn ppu_write(&mut self, addr: u16, data: u8) {
        self.chr.write(addr, data);
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_id(&self) -> u16 {
        0
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("NROM")
    }
}
