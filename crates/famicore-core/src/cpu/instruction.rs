use crate::cpu::addressing::Addressing;

/// The 56 documented 6502 mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

/// One decoded opcode: what to do and how to find the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub addressing: Addressing,
}

/// Base cycle cost of an opcode plus its penalty class.
///
/// - `Normal`: fixed cost (includes the dummy read of write/RMW variants).
/// - `Cross`: read variant that pays +1 when the indexed access crosses a
///   page boundary.
/// - `Branch`: +1 when taken, +1 more when the target is on another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cycle {
    Normal(u64),
    Cross(u64),
    Branch(u64),
}

impl Cycle {
    pub const fn base(self) -> u64 {
        match self {
            Cycle::Normal(c) | Cycle::Cross(c) | Cycle::Branch(c) => c,
        }
    }
}

const fn n(cycle: u64) -> Cycle {
    Cycle::Normal(cycle)
}

const fn c(cycle: u64) -> Cycle {
    Cycle::Cross(cycle)
}

const fn b(cycle: u64) -> Cycle {
    Cycle::Branch(cycle)
}

/// Base cycles per opcode. Entries behind undocumented opcodes are never
/// consulted (decode fails first).
#[rustfmt::skip]
pub(crate) static CYCLE_TABLE: [Cycle; 256] = [
    n(7), n(6), n(0), n(0), n(0), n(3), n(5), n(0), n(3), n(2), n(2), n(0), n(0), n(4), n(6), n(0),
    b(2), c(5), n(0), n(0), n(0), n(4), n(6), n(0), n(2), c(4), n(0), n(0), n(0), c(4), n(7), n(0),
    n(6), n(6), n(0), n(0), n(3), n(3), n(5), n(0), n(4), n(2), n(2), n(0), n(4), n(4), n(6), n(0),
    b(2), c(5), n(0), n(0), n(0), n(4), n(6), n(0), n(2), c(4), n(0), n(0), n(0), c(4), n(7), n(0),
    n(6), n(6), n(0), n(0), n(0), n(3), n(5), n(0), n(3), n(2), n(2), n(0), n(3), n(4), n(6), n(0),
    b(2), c(5), n(0), n(0), n(0), n(4), n(6), n(0), n(2), c(4), n(0), n(0), n(0), c(4), n(7), n(0),
    n(6), n(6), n(0), n(0), n(0), n(3), n(5), n(0), n(4), n(2), n(2), n(0), n(5), n(4), n(6), n(0),
    b(2), c(5), n(0), n(0), n(0), n(4), n(6), n(0), n(2), c(4), n(0), n(0), n(0), c(4), n(7), n(0),
    n(0), n(6), n(0), n(0), n(3), n(3), n(3), n(0), n(2), n(0), n(2), n(0), n(4), n(4), n(4), n(0),
    b(2), n(6), n(0), n(0), n(4), n(4), n(4), n(0), n(2), n(5), n(2), n(0), n(0), n(5), n(0), n(0),
    n(2), n(6), n(2), n(0), n(3), n(3), n(3), n(0), n(2), n(2), n(2), n(0), n(4), n(4), n(4), n(0),
    b(2), c(5), n(0), n(0), n(4), n(4), n(4), n(0), n(2), c(4), n(2), n(0), c(4), c(4), c(4), n(0),
    n(2), n(6), n(0), n(0), n(3), n(3), n(5), n(0), n(2), n(2), n(2), n(0), n(4), n(4), n(6), n(0),
    b(2), c(5), n(0), n(0), n(0), n(4), n(6), n(0), n(2), c(4), n(0), n(0), n(0), c(4), n(7), n(0),
    n(2), n(6), n(0), n(0), n(3), n(3), n(5), n(0), n(2), n(2), n(2), n(0), n(4), n(4), n(6), n(0),
    b(2), c(5), n(0), n(0), n(0), n(4), n(6), n(0), n(2), c(4), n(0), n(0), n(0), c(4), n(7), n(0),
];
