//! Mapper 4 (MMC3) implementation.
//!
//! Provides 8 KiB PRG banking with two switchable and two fixed windows,
//! 2 KiB + 1 KiB CHR banking with optional A12 inversion, mapper-controlled
//! mirroring, PRG-RAM enable/write-protect bits, and the scanline IRQ
//! counter.
//!
//! The IRQ counter is clocked once per rendering scanline through
//! [`super::Mapper::tick_scanline`], which the PPU invokes at dot 260 while
//! rendering is enabled. That stands in for the hardware's PPU A12 rising
//! edge, which lands in the same dot window on every rendering line.
//!
//! | Area | Address range | Behaviour                                       |
//! |------|---------------|-------------------------------------------------|
//! | CPU  | `$6000-$7FFF` | Optional PRG-RAM with enable/write-protect      |
//! | CPU  | `$8000-$9FFF` | PRG slot 0 + bank select/data registers         |
//! | CPU  | `$A000-$BFFF` | PRG slot 1 + mirroring / PRG-RAM registers      |
//! | CPU  | `$C000-$DFFF` | PRG slot 2 + IRQ latch/reload registers         |
//! | CPU  | `$E000-$FFFF` | PRG slot 3 (fixed last) + IRQ disable/enable    |
//! | PPU  | `$0000-$1FFF` | 2×2 KiB + 4×1 KiB CHR banks, A12-aware layout   |

use std::borrow::Cow;

use tracing::trace;

use crate::{
    cartridge::{
        header::{Header, Mirroring},
        mapper::{allocate_prg_ram_with_trainer, select_chr_storage, ChrStorage},
        ChrRom, PrgRom, TrainerBytes,
    },
    memory::cpu as cpu_mem,
    reset_kind::ResetKind,
};

/// PRG-ROM bank size exposed to the CPU (8 KiB).
const PRG_BANK_SIZE_8K: usize = 8 * 1024;
/// CHR banking granularity (1 KiB).
const CHR_BANK_SIZE_1K: usize = 1024;

/// CPU-visible MMC3 register set, mapped as even/odd addresses within each
/// 8 KiB PRG window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CpuRegister {
    /// `$8000/$8001` – bank select and bank data.
    BankSelect,
    BankData,
    /// `$A000/$A001` – mirroring control and PRG-RAM enable/write-protect.
    Mirroring,
    PrgRamProtect,
    /// `$C000/$C001` – IRQ latch value and reload strobe.
    IrqLatch,
    IrqReload,
    /// `$E000/$E001` – IRQ disable/ack and IRQ enable.
    IrqDisable,
    IrqEnable,
}

impl CpuRegister {
    fn from_addr(addr: u16) -> Option<Self> {
        use CpuRegister::*;

        let even = addr & 1 == 0;
        match addr {
            0x8000..=0x9FFF => Some(if even { BankSelect } else { BankData }),
            0xA000..=0xBFFF => Some(if even { Mirroring } else { PrgRamProtect }),
            0xC000..=0xDFFF => Some(if even { IrqLatch } else { IrqReload }),
            0xE000..=0xFFFF => Some(if even { IrqDisable } else { IrqEnable }),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Mapper4 {
    prg_rom: PrgRom,
    prg_ram: Box<[u8]>,
    chr: ChrStorage,

    /// Number of 8 KiB PRG-ROM banks.
    prg_bank_count: usize,

    /// Mirroring from the header. Four-screen boards ignore `$A000` writes.
    base_mirroring: Mirroring,
    mirroring: Mirroring,

    /// Bank select register ($8000): bits 0-2 target register, bit 6 PRG
    /// mode, bit 7 CHR A12 inversion.
    bank_select: u8,
    /// Bank data registers: 0-5 control CHR, 6-7 the switchable PRG banks.
    bank_regs: [u8; 8],

    prg_ram_enable: bool,
    /// `$A001` bit 6: set denies PRG-RAM writes.
    prg_ram_write_protect: bool,

    /// IRQ latch value ($C000).
    irq_latch: u8,
    /// Internal down counter.
    irq_counter: u8,
    /// Set by $C001; the next scanline clock reloads from the latch.
    irq_reload: bool,
    irq_enabled: bool,
    /// Latched IRQ line visible to the CPU core.
    irq_pending: bool,
}

impl Mapper4 {
    pub fn new(header: Header, prg_rom: PrgRom, chr_rom: ChrRom, trainer: TrainerBytes) -> Self {
        let prg_ram = allocate_prg_ram_with_trainer(&header, trainer);
        let chr = select_chr_storage(&header, chr_rom);
        let prg_bank_count = (prg_rom.len() / PRG_BANK_SIZE_8K).max(1);

        Self {
            prg_rom,
            prg_ram,
            chr,
            prg_bank_count,
            base_mirroring: header.mirroring,
            mirroring: header.mirroring,
            bank_select: 0x40,
            bank_regs: [0; 8],
            prg_ram_enable: false,
            prg_ram_write_protect: true,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    /// CHR A12 inversion: 2 KiB banks move from `$0000/$0800` to `$1000/$1800`.
    #[inline]
    fn chr_invert(&self) -> bool {
        self.bank_select & 0x80 != 0
    }

    /// PRG mode bit: false swaps at `$8000`, true swaps at `$C000`.
    #[inline]
    fn prg_swap_at_c000(&self) -> bool {
        self.bank_select & 0x40 != 0
    }

    #[inline]
    fn prg_ram_enabled(&self) -> bool {
        !self.prg_ram.is_empty() && self.prg_ram_enable
    }

    #[inline]
    fn prg_bank_index(&self, reg_value: u8) -> usize {
        reg_value as usize % self.prg_bank_count
    }

    fn read_prg_rom(&self, addr: u16) -> u8 {
        let slot = (addr - cpu_mem::PRG_ROM_START) / PRG_BANK_SIZE_8K as u16;

        let last = self.prg_bank_count - 1;
        let second_last = self.prg_bank_count.saturating_sub(2);

        let bank = if !self.prg_swap_at_c000() {
            // Mode 0: R6 at $8000, R7 at $A000, fixed second-last/last above.
            match slot {
                0 => self.prg_bank_index(self.bank_regs[6]),
                1 => self.prg_bank_index(self.bank_regs[7]),
                2 => second_last,
                _ => last,
            }
        } else {
            // Mode 1: fixed second-last at $8000, R6 moves to $C000.
            match slot {
                0 => second_last,
                1 => self.prg_bank_index(self.bank_regs[7]),
                2 => self.prg_bank_index(self.bank_regs[6]),
                _ => last,
            }
        };

        let offset = (addr as usize - cpu_mem::PRG_ROM_START as usize) & (PRG_BANK_SIZE_8K - 1);
        self.prg_rom
            .get(bank * PRG_BANK_SIZE_8K + offset)
            .copied()
            .unwrap_or(0)
    }

    /// Resolve the CHR bank base and in-bank offset for a PPU address,
    /// honouring the current layout mode.
    ///
    /// R0/R1 are 2 KiB banks whose low bit is forced to zero by the
    /// hardware (A10 is not connected to the register).
    fn chr_index(&self, addr: u16) -> (usize, usize) {
        let a = addr & 0x1FFF;
        let offset = a as usize;

        // Map the address to (register, window base) for both layouts.
        let (reg, window_base, wide) = if !self.chr_invert() {
            match a {
                0x0000..=0x07FF => (0, 0x0000, true),
                0x0800..=0x0FFF => (1, 0x0800, true),
                0x1000..=0x13FF => (2, 0x1000, false),
                0x1400..=0x17FF => (3, 0x1400, false),
                0x1800..=0x1BFF => (4, 0x1800, false),
                _ => (5, 0x1C00, false),
            }
        } else {
            match a {
                0x0000..=0x03FF => (2, 0x0000, false),
                0x0400..=0x07FF => (3, 0x0400, false),
                0x0800..=0x0BFF => (4, 0x0800, false),
                0x0C00..=0x0FFF => (5, 0x0C00, false),
                0x1000..=0x17FF => (0, 0x1000, true),
                _ => (1, 0x1800, true),
            }
        };

        let bank = if wide {
            (self.bank_regs[reg] & !1) as usize
        } else {
            self.bank_regs[reg] as usize
        };
        (bank * CHR_BANK_SIZE_1K, offset - window_base)
    }

    fn write_register(&mut self, reg: CpuRegister, data: u8) {
        use CpuRegister::*;

        match reg {
            BankSelect => self.bank_select = data,
            BankData => {
                let index = (self.bank_select & 0x07) as usize;
                self.bank_regs[index] = data;
                trace!(index, data, "mmc3 bank data");
            }
            Mirroring => {
                // Four-screen boards keep their fixed layout.
                if self.base_mirroring != crate::cartridge::header::Mirroring::FourScreen {
                    self.mirroring = if data & 0x01 == 0 {
                        crate::cartridge::header::Mirroring::Vertical
                    } else {
                        crate::cartridge::header::Mirroring::Horizontal
                    };
                }
            }
            PrgRamProtect => {
                self.prg_ram_enable = data & 0x80 != 0;
                self.prg_ram_write_protect = data & 0x40 != 0;
            }
            IrqLatch => self.irq_latch = data,
            IrqReload => self.irq_reload = true,
            IrqDisable => {
                // $E000 disables further IRQs and acknowledges a pending one.
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            IrqEnable => self.irq_enabled = true,
        }
    }
}

impl super::Mapper for Mapper4 {
    fn reset(&mut self, kind: ResetKind) {
        if matches!(kind, ResetKind::PowerOn) {
            self.bank_select = 0x40;
            self.bank_regs = [0; 8];
            self.prg_ram_enable = false;
            self.prg_ram_write_protect = true;
            self.mirroring = self.base_mirroring;
        }
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_pending = false;
    }

    fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => {
                if !self.prg_ram_enabled() {
                    return None;
                }
                let idx = (addr - cpu_mem::PRG_RAM_START) as usize % self.prg_ram.len();
                Some(self.prg_ram[idx])
            }
            cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END => Some(self.read_prg_rom(addr)),
            _ => None,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8, _cpu_cycle: u64) {
        if (cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END).contains(&addr) {
            if self.prg_ram_enabled() && !self.prg_ram_write_protect {
                let idx = (addr - cpu_mem::PRG_RAM_START) as usize % self.prg_ram.len();
                self.prg_ram[idx] = data;
            }
            return;
        }

        if let Some(reg) = CpuRegister::from_addr(addr) {
            self.write_register(reg, data);
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        let (base, offset) = self.chr_index(addr);
        self.chr.read_indexed(base, offset)
    }

    fn ppu_write(&mut self, addr: u16, data: u8) {
        let (base, offset) = self.chr_index(addr);
        self.chr.write_indexed(base, offset, data);
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Scanline clock (dot 260 of every rendering line).
    ///
    /// On reload (or a counter already at zero) the counter takes the latch
    /// value, otherwise it decrements; reaching zero with IRQs enabled
    /// asserts the line until the game acknowledges through `$E000`.
    fn tick_scanline(&mut self) {
        if self.irq_reload || self.irq_counter == 0 {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn mapper_id(&self) -> u16 {
        4
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("MMC3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::header::{RomFormat, PRG_RAM_SIZE};
    use crate::cartridge::Mapper;

    fn board(banks_8k: usize) -> Mapper4 {
        let mut prg = vec![0u8; banks_8k * PRG_BANK_SIZE_8K];
        for bank in 0..banks_8k {
            prg[bank * PRG_BANK_SIZE_8K..(bank + 1) * PRG_BANK_SIZE_8K].fill(bank as u8);
        }
        let header = Header {
            format: RomFormat::INes,
            mapper: 4,
            mirroring: Mirroring::Horizontal,
            battery_backed_ram: false,
            trainer_present: false,
            prg_rom_size: prg.len(),
            chr_rom_size: 0,
            chr_ram_size: 8 * 1024,
            prg_ram_size: PRG_RAM_SIZE,
        };
        let mut board = Mapper4::new(header, prg.into(), vec![].into(), None);
        board.reset(ResetKind::PowerOn);
        board
    }

    #[test]
    fn fixed_banks_follow_prg_mode() {
        let mut board = board(8);

        // Mode 0: $C000 second-last, $E000 last.
        board.cpu_write(0x8000, 0x06, 0);
        board.cpu_write(0x8001, 2, 0); // R6 = 2
        assert_eq!(board.cpu_read(0x8000), Some(2));
        assert_eq!(board.cpu_read(0xC000), Some(6));
        assert_eq!(board.cpu_read(0xE000), Some(7));

        // Mode 1: $8000 second-last, R6 moves to $C000.
        board.cpu_write(0x8000, 0x46, 0);
        assert_eq!(board.cpu_read(0x8000), Some(6));
        assert_eq!(board.cpu_read(0xC000), Some(2));
        assert_eq!(board.cpu_read(0xE000), Some(7));
    }

    #[test]
    fn chr_2k_banks_force_even_register_values() {
        let mut board = board(4);
        board.cpu_write(0x8000, 0x00, 0);
        board.cpu_write(0x8001, 0x05, 0); // R0 = 5 -> effective bank 4
        board.ppu_write(0x0000, 0xAA);
        // Bank 4, offset 0 equals absolute CHR index 4 KiB.
        assert_eq!(board.chr_index(0x0000), (4 * CHR_BANK_SIZE_1K, 0));
    }

    #[test]
    fn scanline_irq_counts_down_from_latch() {
        let mut board = board(4);
        board.cpu_write(0xC000, 3, 0); // latch = 3
        board.cpu_write(0xC001, 0, 0); // reload on next clock
        board.cpu_write(0xE001, 0, 0); // enable

        board.tick_scanline(); // reload -> 3
        board.tick_scanline(); // 2
        board.tick_scanline(); // 1
        assert!(!board.irq_pending());
        board.tick_scanline(); // 0 -> IRQ
        assert!(board.irq_pending());

        // $E000 acknowledges and disables.
        board.cpu_write(0xE000, 0, 0);
        assert!(!board.irq_pending());
    }

    #[test]
    fn mirroring_register_switches_layout() {
        let mut board = board(4);
        board.cpu_write(0xA000, 0, 0);
        assert_eq!(board.mirroring(), Mirroring::Vertical);
        board.cpu_write(0xA000, 1, 0);
        assert_eq!(board.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn prg_ram_protect_bits() {
        let mut board = board(4);
        // Disabled by default.
        assert_eq!(board.cpu_read(0x6000), None);

        // Enable with write protection.
        board.cpu_write(0xA001, 0xC0, 0);
        board.cpu_write(0x6000, 0x11, 0);
        assert_eq!(board.cpu_read(0x6000), Some(0));

        // Enable with writes allowed.
        board.cpu_write(0xA001, 0x80, 0);
        board.cpu_write(0x6000, 0x22, 0);
        assert_eq!(board.cpu_read(0x6000), Some(0x22));
    }
}
