//! Decode table for the documented instruction set.
//!
//! Entries are `None` for the 105 undocumented opcodes; fetching one of
//! those is a fatal [`crate::error::Error::IllegalOpcode`].

use crate::cpu::addressing::Addressing as A;
use crate::cpu::instruction::{Instruction, Mnemonic};

// Short aliases for addressing modes (to keep the 16x16 table readable).
const IMP: A = A::Implied;
const ACC: A = A::Accumulator;
const IMM: A = A::Immediate;
const REL: A = A::Relative;
const ZP: A = A::ZeroPage;
const ZPX: A = A::ZeroPageX;
const ZPY: A = A::ZeroPageY;
const ABS: A = A::Absolute;
const ABX: A = A::AbsoluteX;
const ABY: A = A::AbsoluteY;
const IND: A = A::Indirect;
const INX: A = A::IndirectX;
const INY: A = A::IndirectY;

macro_rules! op {
    ($ins:ident, $addr:ident) => {
        Some(Instruction {
            mnemonic: Mnemonic::$ins,
            addressing: $addr,
        })
    };
}

const ___: Option<Instruction> = None;

#[rustfmt::skip]
pub(crate) static LOOKUP_TABLE: [Option<Instruction>; 256] = [
    // 0              1              2              3    4              5              6              7
    // 8              9              A              B    C              D              E              F

    // 0x00
    op!(Brk, IMP), op!(Ora, INX), ___,           ___, ___,           op!(Ora, ZP),  op!(Asl, ZP),  ___,
    op!(Php, IMP), op!(Ora, IMM), op!(Asl, ACC), ___, ___,           op!(Ora, ABS), op!(Asl, ABS), ___,

    // 0x10
    op!(Bpl, REL), op!(Ora, INY), ___,           ___, ___,           op!(Ora, ZPX), op!(Asl, ZPX), ___,
    op!(Clc, IMP), op!(Ora, ABY), ___,           ___, ___,           op!(Ora, ABX), op!(Asl, ABX), ___,

    // 0x20
    op!(Jsr, ABS), op!(And, INX), ___,           ___, op!(Bit, ZP),  op!(And, ZP),  op!(Rol, ZP),  ___,
    op!(Plp, IMP), op!(And, IMM), op!(Rol, ACC), ___, op!(Bit, ABS), op!(And, ABS), op!(Rol, ABS), ___,

    // 0x30
    op!(Bmi, REL), op!(And, INY), ___,           ___, ___,           op!(And, ZPX), op!(Rol, ZPX), ___,
    op!(Sec, IMP), op!(And, ABY), ___,           ___, ___,           op!(And, ABX), op!(Rol, ABX), ___,

    // 0x40
    op!(Rti, IMP), op!(Eor, INX), ___,           ___, ___,           op!(Eor, ZP),  op!(Lsr, ZP),  ___,
    op!(Pha, IMP), op!(Eor, IMM), op!(Lsr, ACC), ___, op!(Jmp, ABS), op!(Eor, ABS), op!(Lsr, ABS), ___,

    // 0x50
    op!(Bvc, REL), op!(Eor, INY), ___,           ___, ___,           op!(Eor, ZPX), op!(Lsr, ZPX), ___,
    op!(Cli, IMP), op!(Eor, ABY), ___,           ___, ___,           op!(Eor, ABX), op!(Lsr, ABX), ___,

    // 0x60
    op!(Rts, IMP), op!(Adc, INX), ___,           ___, ___,           op!(Adc, ZP),  op!(Ror, ZP),  ___,
    op!(Pla, IMP), op!(Adc, IMM), op!(Ror, ACC), ___, op!(Jmp, IND), op!(Adc, ABS), op!(Ror, ABS), ___,

    // 0x70
    op!(Bvs, REL), op!(Adc, INY), ___,           ___, ___,           op!(Adc, ZPX), op!(Ror, ZPX), ___,
    op!(Sei, IMP), op!(Adc, ABY), ___,           ___, ___,           op!(Adc, ABX), op!(Ror, ABX), ___,

    // 0x80
    ___,           op!(Sta, INX), ___,           ___, op!(Sty, ZP),  op!(Sta, ZP),  op!(Stx, ZP),  ___,
    op!(Dey, IMP), ___,           op!(Txa, IMP), ___, op!(Sty, ABS), op!(Sta, ABS), op!(Stx, ABS), ___,

    // 0x90
    op!(Bcc, REL), op!(Sta, INY), ___,           ___, op!(Sty, ZPX), op!(Sta, ZPX), op!(Stx, ZPY), ___,
    op!(Tya, IMP), op!(Sta, ABY), op!(Txs, IMP), ___, ___,           op!(Sta, ABX), ___,           ___,

    // 0xA0
    op!(Ldy, IMM), op!(Lda, INX), op!(Ldx, IMM), ___, op!(Ldy, ZP),  op!(Lda, ZP),  op!(Ldx, ZP),  ___,
    op!(Tay, IMP), op!(Lda, IMM), op!(Tax, IMP), ___, op!(Ldy, ABS), op!(Lda, ABS), op!(Ldx, ABS), ___,

    // 0xB0
    op!(Bcs, REL), op!(Lda, INY), ___,           ___, op!(Ldy, ZPX), op!(Lda, ZPX), op!(Ldx, ZPY), ___,
    op!(Clv, IMP), op!(Lda, ABY), op!(Tsx, IMP), ___, op!(Ldy, ABX), op!(Lda, ABX), op!(Ldx, ABY), ___,

    // 0xC0
    op!(Cpy, IMM), op!(Cmp, INX), ___,           ___, op!(Cpy, ZP),  op!(Cmp, ZP),  op!(Dec, ZP),  ___,
    op!(Iny, IMP), op!(Cmp, IMM), op!(Dex, IMP), ___, op!(Cpy, ABS), op!(Cmp, ABS), op!(Dec, ABS), ___,

    // 0xD0
    op!(Bne, REL), op!(Cmp, INY), ___,           ___, ___,           op!(Cmp, ZPX), op!(Dec, ZPX), ___,
    op!(Cld, IMP), op!(Cmp, ABY), ___,           ___, ___,           op!(Cmp, ABX), op!(Dec, ABX), ___,

    // 0xE0
    op!(Cpx, IMM), op!(Sbc, INX), ___,           ___, op!(Cpx, ZP),  op!(Sbc, ZP),  op!(Inc, ZP),  ___,
    op!(Inx, IMP), op!(Sbc, IMM), op!(Nop, IMP), ___, op!(Cpx, ABS), op!(Sbc, ABS), op!(Inc, ABS), ___,

    // 0xF0
    op!(Beq, REL), op!(Sbc, INY), ___,           ___, ___,           op!(Sbc, ZPX), op!(Inc, ZPX), ___,
    op!(Sed, IMP), op!(Sbc, ABY), ___,           ___, ___,           op!(Sbc, ABX), op!(Inc, ABX), ___,
];
