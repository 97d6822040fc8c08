//! Mapper 2 – UxROM: 16 KiB PRG bank switching, fixed top bank.
//!
//! Any CPU write to `$8000-$FFFF` selects the 16 KiB bank visible at
//! `$8000-$BFFF`; `$C000-$FFFF` always shows the last bank. CHR is an
//! unbanked 8 KiB, almost always RAM on real boards.

use std::borrow::Cow;

use crate::{
    cartridge::{
        header::{Header, Mirroring},
        mapper::{allocate_prg_ram_with_trainer, select_chr_storage, ChrStorage},
        ChrRom, PrgRom, TrainerBytes,
    },
    memory::cpu as cpu_mem,
};

const PRG_BANK_SIZE_16K: usize = 16 * 1024;

#[derive(Debug)]
pub struct Mapper2 {
    prg_rom: PrgRom,
    prg_ram: Box<[u8]>,
    chr: ChrStorage,
    prg_bank_count: usize,
    /// Bank latched into the `$8000-$BFFF` window.
    prg_bank: u8,
    mirroring: Mirroring,
}

impl Mapper2 {
    pub fn new(header: Header, prg_rom: PrgRom, chr_rom: ChrRom, trainer: TrainerBytes) -> Self {
        let prg_bank_count = (prg_rom.len() / PRG_BANK_SIZE_16K).max(1);
        Self {
            prg_rom,
            prg_ram: allocate_prg_ram_with_trainer(&header, trainer),
            chr: select_chr_storage(&header, chr_rom),
            prg_bank_count,
            prg_bank: 0,
            mirroring: header.mirroring,
        }
    }

    fn read_prg_rom(&self, addr: u16) -> u8 {
        let bank = if addr < 0xC000 {
            self.prg_bank as usize % self.prg_bank_count
        } else {
            self.prg_bank_count - 1
        };
        let offset = (addr - cpu_mem::PRG_ROM_START) as usize % PRG_BANK_SIZE_16K;
        self.prg_rom
            .get(bank * PRG_BANK_SIZE_16K + offset)
            .copied()
            .unwrap_or(0)
    }
}

impl super::Mapper for Mapper2 {
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
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => {
                let idx = (addr - cpu_mem::PRG_RAM_START) as usize % self.prg_ram.len();
                self.prg_ram[idx] = data;
            }
            cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END => self.prg_bank = data,
            _ => {}
        }
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
        2
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("UxROM")
    }
}
