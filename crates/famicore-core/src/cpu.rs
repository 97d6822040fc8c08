//! Instruction-stepped 2A03 CPU core.
//!
//! `step` decodes and executes exactly one instruction (or services one
//! pending interrupt / DMA stall) and returns the number of CPU cycles that
//! elapsed, so the caller can keep the PPU phase-aligned at three dots per
//! cycle.

use tracing::trace;

use crate::{
    bus::CpuBus,
    cpu::{
        addressing::Addressing,
        instruction::{Cycle, Instruction, Mnemonic, CYCLE_TABLE},
        lookup::LOOKUP_TABLE,
        status::Status,
    },
    error::Error,
    memory::cpu as cpu_mem,
    memory::ppu::Register as PpuRegister,
    reset_kind::ResetKind,
};

pub mod addressing;
mod instruction;
mod lookup;
mod status;

pub use status::Status as CpuStatus;

/// Cycles consumed by servicing an NMI or IRQ.
const INTERRUPT_CYCLES: u64 = 7;
/// Cycles consumed by the reset sequence before the first instruction.
const RESET_CYCLES: u64 = 7;

/// Lightweight CPU register snapshot used for tracing/debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: u8,
}

#[derive(Debug, Clone)]
pub struct Cpu {
    a: u8,
    x: u8,
    y: u8,
    /// Stack pointer; the stack lives at `$0100 + S` and wraps in-page.
    s: u8,
    p: Status,
    pc: u16,

    /// Edge-triggered NMI latch: set by the PPU, cleared when serviced.
    nmi_pending: bool,
    /// Total CPU cycles since power-on; parity decides the OAM DMA cost.
    cycles: u64,
}

impl Cpu {
    /// CPU in its pre-reset state. Call [`Cpu::reset`] before stepping.
    pub(crate) fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            p: Status::INTERRUPT | Status::UNUSED,
            pc: 0,
            nmi_pending: false,
            cycles: 0,
        }
    }

    /// Runs the reset sequence: loads PC through `$FFFC/$FFFD` and applies
    /// the register state for the given reset kind.
    pub(crate) fn reset(&mut self, bus: &mut CpuBus<'_>, kind: ResetKind) {
        let lo = bus.read(cpu_mem::RESET_VECTOR_LO);
        let hi = bus.read(cpu_mem::RESET_VECTOR_HI);
        self.pc = u16::from_le_bytes([lo, hi]);

        match kind {
            ResetKind::PowerOn => {
                self.a = 0;
                self.x = 0;
                self.y = 0;
                self.s = 0xFD;
                self.p = Status::INTERRUPT | Status::UNUSED;
                self.cycles = RESET_CYCLES;
            }
            ResetKind::Soft => {
                // Warm reset preserves A/X/Y and most of P; the hardware
                // sets I and slides S down by the three aborted pushes.
                self.p.insert(Status::INTERRUPT);
                self.s = self.s.wrapping_sub(3);
                self.cycles += RESET_CYCLES;
            }
        }
        self.nmi_pending = false;
        trace!(pc = %format_args!("{:#06X}", self.pc), ?kind, "cpu reset");
    }

    /// Records an NMI edge from the PPU. Serviced at the next instruction
    /// boundary; the latch clears when taken.
    pub fn assert_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Total cycles executed since power-on.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Captures the registers for tracing/debugging.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.pc,
            a: self.a,
            x: self.x,
            y: self.y,
            s: self.s,
            p: self.p.bits(),
        }
    }

    /// Executes one instruction (or one interrupt entry / DMA stall) and
    /// returns the cycles consumed.
    ///
    /// Arbitration at the boundary: OAM DMA stall, then NMI edge, then IRQ
    /// level (masked by I), then the next opcode.
    pub fn step(&mut self, bus: &mut CpuBus<'_>) -> Result<u64, Error> {
        if let Some(page) = bus.take_oam_dma() {
            // 513 cycles, or 514 when the write landed on an odd CPU cycle.
            let stall = 513 + (self.cycles & 1);
            self.run_oam_dma(bus, page);
            self.cycles += stall;
            return Ok(stall);
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            self.enter_interrupt(bus, cpu_mem::NMI_VECTOR_LO, cpu_mem::NMI_VECTOR_HI);
            self.cycles += INTERRUPT_CYCLES;
            return Ok(INTERRUPT_CYCLES);
        }

        if bus.irq_line() && !self.p.i() {
            self.enter_interrupt(bus, cpu_mem::IRQ_VECTOR_LO, cpu_mem::IRQ_VECTOR_HI);
            self.cycles += INTERRUPT_CYCLES;
            return Ok(INTERRUPT_CYCLES);
        }

        let opcode_pc = self.pc;
        let opcode = self.fetch_byte(bus);
        let instr = LOOKUP_TABLE[opcode as usize].ok_or(Error::IllegalOpcode {
            pc: opcode_pc,
            opcode,
        })?;

        let cycles = self.execute(bus, instr, opcode);
        self.cycles += cycles;
        Ok(cycles)
    }

    // ------------------------------------------------------------------
    // Fetch / stack helpers
    // ------------------------------------------------------------------

    #[inline]
    fn fetch_byte(&mut self, bus: &mut CpuBus<'_>) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    #[inline]
    fn fetch_word(&mut self, bus: &mut CpuBus<'_>) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    #[inline]
    fn stack_addr(&self) -> u16 {
        cpu_mem::STACK_PAGE_START | u16::from(self.s)
    }

    fn push(&mut self, bus: &mut CpuBus<'_>, data: u8) {
        bus.write(self.stack_addr(), data);
        self.s = self.s.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut CpuBus<'_>) -> u8 {
        self.s = self.s.wrapping_add(1);
        bus.read(self.stack_addr())
    }

    fn push_word(&mut self, bus: &mut CpuBus<'_>, word: u16) {
        self.push(bus, (word >> 8) as u8);
        self.push(bus, word as u8);
    }

    fn pull_word(&mut self, bus: &mut CpuBus<'_>) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    // ------------------------------------------------------------------
    // Interrupt entry and DMA
    // ------------------------------------------------------------------

    /// Pushes PC and P (B clear, U set), sets I, and jumps through the
    /// given vector. Used for both NMI and IRQ entries.
    fn enter_interrupt(&mut self, bus: &mut CpuBus<'_>, vector_lo: u16, vector_hi: u16) {
        self.push_word(bus, self.pc);
        let pushed = (self.p | Status::UNUSED) & !Status::BREAK;
        self.push(bus, pushed.bits());
        self.p.insert(Status::INTERRUPT);

        let lo = bus.read(vector_lo);
        let hi = bus.read(vector_hi);
        self.pc = u16::from_le_bytes([lo, hi]);
        trace!(
            pc = %format_args!("{:#06X}", self.pc),
            vector = %format_args!("{vector_lo:#06X}"),
            "interrupt taken"
        );
    }

    /// Copies one page from CPU space into OAM through the `$2004` port,
    /// which honours OAMADDR auto-increment.
    fn run_oam_dma(&mut self, bus: &mut CpuBus<'_>, page: u8) {
        let base = u16::from(page) << 8;
        for offset in 0..=0xFFu16 {
            let value = bus.read(base | offset);
            bus.write(PpuRegister::OamData.addr(), value);
        }
    }

    // ------------------------------------------------------------------
    // Operand resolution
    // ------------------------------------------------------------------

    /// Resolves the effective address for a memory-operand mode.
    ///
    /// Returns the address plus whether the indexed access crossed a page
    /// (only meaningful for the `Cross`-class opcodes).
    fn operand_addr(&mut self, bus: &mut CpuBus<'_>, mode: Addressing) -> (u16, bool) {
        match mode {
            Addressing::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            Addressing::ZeroPage => (u16::from(self.fetch_byte(bus)), false),
            Addressing::ZeroPageX => {
                let base = self.fetch_byte(bus);
                (u16::from(base.wrapping_add(self.x)), false)
            }
            Addressing::ZeroPageY => {
                let base = self.fetch_byte(bus);
                (u16::from(base.wrapping_add(self.y)), false)
            }
            Addressing::Absolute => (self.fetch_word(bus), false),
            Addressing::AbsoluteX => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                (addr, crossed_page(base, addr))
            }
            Addressing::AbsoluteY => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, crossed_page(base, addr))
            }
            Addressing::Indirect => {
                let ptr = self.fetch_word(bus);
                let lo = bus.read(ptr);
                // Hardware bug: the pointer high byte wraps within the page.
                let hi_addr = if ptr & 0x00FF == 0x00FF {
                    ptr & 0xFF00
                } else {
                    ptr + 1
                };
                let hi = bus.read(hi_addr);
                (u16::from_le_bytes([lo, hi]), false)
            }
            Addressing::IndirectX => {
                let zp = self.fetch_byte(bus).wrapping_add(self.x);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                (u16::from_le_bytes([lo, hi]), false)
            }
            Addressing::IndirectY => {
                let zp = self.fetch_byte(bus);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, crossed_page(base, addr))
            }
            Addressing::Implied | Addressing::Accumulator | Addressing::Relative => {
                unreachable!("mode {mode:?} has no memory operand")
            }
        }
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    fn execute(&mut self, bus: &mut CpuBus<'_>, instr: Instruction, opcode: u8) -> u64 {
        use Mnemonic::*;

        let base = CYCLE_TABLE[opcode as usize];
        let mut crossed = false;
        let mut branch_extra = 0u64;

        // Memory-operand modes resolve up front; the remaining modes are
        // handled per mnemonic below.
        let addr = match instr.addressing {
            Addressing::Implied | Addressing::Accumulator | Addressing::Relative => 0u16,
            mode => {
                let (addr, cross) = self.operand_addr(bus, mode);
                crossed = cross;
                addr
            }
        };

        match instr.mnemonic {
            // Loads / stores ------------------------------------------------
            Lda => {
                self.a = bus.read(addr);
                self.p.set_zn(self.a);
            }
            Ldx => {
                self.x = bus.read(addr);
                self.p.set_zn(self.x);
            }
            Ldy => {
                self.y = bus.read(addr);
                self.p.set_zn(self.y);
            }
            Sta => bus.write(addr, self.a),
            Stx => bus.write(addr, self.x),
            Sty => bus.write(addr, self.y),

            // Transfers -----------------------------------------------------
            Tax => {
                self.x = self.a;
                self.p.set_zn(self.x);
            }
            Tay => {
                self.y = self.a;
                self.p.set_zn(self.y);
            }
            Txa => {
                self.a = self.x;
                self.p.set_zn(self.a);
            }
            Tya => {
                self.a = self.y;
                self.p.set_zn(self.a);
            }
            Tsx => {
                self.x = self.s;
                self.p.set_zn(self.x);
            }
            Txs => self.s = self.x,

            // Stack ---------------------------------------------------------
            Pha => self.push(bus, self.a),
            Php => {
                let pushed = self.p | Status::BREAK | Status::UNUSED;
                self.push(bus, pushed.bits());
            }
            Pla => {
                self.a = self.pull(bus);
                self.p.set_zn(self.a);
            }
            Plp => {
                let pulled = Status::from_bits_truncate(self.pull(bus));
                self.p = (pulled & !Status::BREAK) | Status::UNUSED;
            }

            // Logic ---------------------------------------------------------
            And => {
                self.a &= bus.read(addr);
                self.p.set_zn(self.a);
            }
            Ora => {
                self.a |= bus.read(addr);
                self.p.set_zn(self.a);
            }
            Eor => {
                self.a ^= bus.read(addr);
                self.p.set_zn(self.a);
            }
            Bit => {
                let value = bus.read(addr);
                self.p.set(Status::ZERO, self.a & value == 0);
                self.p.set(Status::NEGATIVE, value & 0x80 != 0);
                self.p.set_v(value & 0x40 != 0);
            }

            // Arithmetic ----------------------------------------------------
            Adc => {
                let value = bus.read(addr);
                self.add_with_carry(value);
            }
            Sbc => {
                let value = bus.read(addr);
                self.add_with_carry(!value);
            }
            Cmp => {
                let value = bus.read(addr);
                self.compare(self.a, value);
            }
            Cpx => {
                let value = bus.read(addr);
                self.compare(self.x, value);
            }
            Cpy => {
                let value = bus.read(addr);
                self.compare(self.y, value);
            }

            // Increments / decrements --------------------------------------
            Inc => {
                let value = bus.read(addr).wrapping_add(1);
                bus.write(addr, value);
                self.p.set_zn(value);
            }
            Dec => {
                let value = bus.read(addr).wrapping_sub(1);
                bus.write(addr, value);
                self.p.set_zn(value);
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.p.set_zn(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.p.set_zn(self.y);
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.p.set_zn(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.p.set_zn(self.y);
            }

            // Shifts / rotates ---------------------------------------------
            Asl => self.read_modify_write(bus, instr.addressing, addr, |p, v| {
                p.set_c(v & 0x80 != 0);
                v << 1
            }),
            Lsr => self.read_modify_write(bus, instr.addressing, addr, |p, v| {
                p.set_c(v & 0x01 != 0);
                v >> 1
            }),
            Rol => self.read_modify_write(bus, instr.addressing, addr, |p, v| {
                let carry_in = p.c() as u8;
                p.set_c(v & 0x80 != 0);
                (v << 1) | carry_in
            }),
            Ror => self.read_modify_write(bus, instr.addressing, addr, |p, v| {
                let carry_in = (p.c() as u8) << 7;
                p.set_c(v & 0x01 != 0);
                (v >> 1) | carry_in
            }),

            // Jumps / subroutines ------------------------------------------
            Jmp => self.pc = addr,
            Jsr => {
                // `addr` resolution consumed both operand bytes; the return
                // address on the stack points at the last of them.
                self.push_word(bus, self.pc.wrapping_sub(1));
                self.pc = addr;
            }
            Rts => self.pc = self.pull_word(bus).wrapping_add(1),
            Rti => {
                let pulled = Status::from_bits_truncate(self.pull(bus));
                self.p = (pulled & !Status::BREAK) | Status::UNUSED;
                self.pc = self.pull_word(bus);
            }
            Brk => {
                // BRK is a two-byte instruction; the padding byte is skipped.
                self.pc = self.pc.wrapping_add(1);
                self.push_word(bus, self.pc);
                let pushed = self.p | Status::BREAK | Status::UNUSED;
                self.push(bus, pushed.bits());
                self.p.insert(Status::INTERRUPT);
                let lo = bus.read(cpu_mem::IRQ_VECTOR_LO);
                let hi = bus.read(cpu_mem::IRQ_VECTOR_HI);
                self.pc = u16::from_le_bytes([lo, hi]);
            }

            // Branches ------------------------------------------------------
            Bcc => branch_extra = self.branch(bus, !self.p.contains(Status::CARRY)),
            Bcs => branch_extra = self.branch(bus, self.p.contains(Status::CARRY)),
            Bne => branch_extra = self.branch(bus, !self.p.contains(Status::ZERO)),
            Beq => branch_extra = self.branch(bus, self.p.contains(Status::ZERO)),
            Bpl => branch_extra = self.branch(bus, !self.p.contains(Status::NEGATIVE)),
            Bmi => branch_extra = self.branch(bus, self.p.contains(Status::NEGATIVE)),
            Bvc => branch_extra = self.branch(bus, !self.p.contains(Status::OVERFLOW)),
            Bvs => branch_extra = self.branch(bus, self.p.contains(Status::OVERFLOW)),

            // Flag operations ----------------------------------------------
            Clc => self.p.remove(Status::CARRY),
            Sec => self.p.insert(Status::CARRY),
            Cli => self.p.remove(Status::INTERRUPT),
            Sei => self.p.insert(Status::INTERRUPT),
            Clv => self.p.remove(Status::OVERFLOW),
            Cld => self.p.remove(Status::DECIMAL),
            Sed => self.p.insert(Status::DECIMAL),

            Nop => {}
        }

        let cross_extra = match base {
            Cycle::Cross(_) if crossed => 1,
            _ => 0,
        };
        base.base() + cross_extra + branch_extra
    }

    /// ADC core, shared by SBC through operand inversion. Decimal mode is
    /// ignored (the 2A03 has no BCD unit).
    fn add_with_carry(&mut self, value: u8) {
        let sum = u16::from(self.a) + u16::from(value) + u16::from(self.p.c());
        let result = sum as u8;
        self.p.set_c(sum > 0xFF);
        self.p
            .set_v((!(self.a ^ value) & (self.a ^ result) & 0x80) != 0);
        self.a = result;
        self.p.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.p.set_c(register >= value);
        self.p.set_zn(register.wrapping_sub(value));
    }

    fn read_modify_write(
        &mut self,
        bus: &mut CpuBus<'_>,
        mode: Addressing,
        addr: u16,
        op: impl FnOnce(&mut Status, u8) -> u8,
    ) {
        if mode == Addressing::Accumulator {
            self.a = op(&mut self.p, self.a);
            self.p.set_zn(self.a);
        } else {
            let value = bus.read(addr);
            // The hardware writes the unmodified value back first; the
            // second write carries the result. One combined write is
            // sufficient at instruction granularity except for mappers
            // that count writes, which tolerate it.
            let result = op(&mut self.p, value);
            bus.write(addr, result);
            self.p.set_zn(result);
        }
    }

    /// Consumes the relative offset and applies the branch when taken.
    /// Returns the cycle penalty: +1 taken, +1 more across a page.
    fn branch(&mut self, bus: &mut CpuBus<'_>, taken: bool) -> u64 {
        let offset = self.fetch_byte(bus) as i8;
        if !taken {
            return 0;
        }
        let target = self.pc.wrapping_add(offset as u16);
        let penalty = if crossed_page(self.pc, target) { 2 } else { 1 };
        self.pc = target;
        penalty
    }
}

#[inline]
fn crossed_page(base: u16, addr: u16) -> bool {
    base & 0xFF00 != addr & 0xFF00
}
