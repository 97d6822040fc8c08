//! Instruction-level timing and behaviour checks driven through full
//! console images.

mod common;

use anyhow::Result;
use famicore_core::{error::Error, Nes};

use common::{nrom_with_program, RomBuilder};

fn console_with(program: &[u8]) -> Result<Nes> {
    let mut nes = Nes::new();
    nes.load_rom(&nrom_with_program(program).build())?;
    Ok(nes)
}

#[test]
fn store_loop_writes_ram_and_register() -> Result<()> {
    // LDA #$42; STA $0200; JMP $8000
    let mut nes = console_with(&[0xA9, 0x42, 0x8D, 0x00, 0x02, 0x4C, 0x00, 0x80])?;

    while nes.cpu_cycles() < 1_000 {
        nes.step()?;
    }

    assert_eq!(nes.peek_cpu_byte(0x0200), 0x42);
    assert_eq!(nes.cpu_snapshot().a, 0x42);
    Ok(())
}

#[test]
fn basic_instruction_cycle_costs() -> Result<()> {
    // LDA #$01 (2), LDA $00 (3), LDA $0000 (4), STA $0300 (4), NOP (2)
    let mut nes = console_with(&[
        0xA9, 0x01, 0xA5, 0x00, 0xAD, 0x00, 0x00, 0x8D, 0x00, 0x03, 0xEA,
    ])?;

    assert_eq!(nes.step()?, 2);
    assert_eq!(nes.step()?, 3);
    assert_eq!(nes.step()?, 4);
    assert_eq!(nes.step()?, 4);
    assert_eq!(nes.step()?, 2);
    Ok(())
}

#[test]
fn indexed_read_pays_for_page_cross() -> Result<()> {
    // LDX #$01; LDA $00FF,X (crosses into $0100); LDA $0000,X (no cross)
    let mut nes = console_with(&[0xA2, 0x01, 0xBD, 0xFF, 0x00, 0xBD, 0x00, 0x00])?;

    assert_eq!(nes.step()?, 2);
    assert_eq!(nes.step()?, 5, "page-crossing read costs the extra cycle");
    assert_eq!(nes.step()?, 4, "same-page read stays at the base cost");
    Ok(())
}

#[test]
fn indexed_store_never_pays_the_cross_penalty() -> Result<()> {
    // LDX #$01; STA $00FF,X; STA $0000,X
    let mut nes = console_with(&[0xA2, 0x01, 0x9D, 0xFF, 0x00, 0x9D, 0x00, 0x00])?;

    nes.step()?;
    assert_eq!(nes.step()?, 5);
    assert_eq!(nes.step()?, 5);
    Ok(())
}

#[test]
fn branch_cycle_penalties() -> Result<()> {
    // $8000: LDX #$00      -> Z set
    // $8002: BEQ +0        -> taken, same page: 3 cycles
    // $8004: BNE +9        -> not taken: 2 cycles
    // $8006: BEQ +$77      -> taken to $807F... still same page: 3
    let mut nes = console_with(&[0xA2, 0x00, 0xF0, 0x00, 0xD0, 0x09, 0xF0, 0x77])?;

    nes.step()?;
    assert_eq!(nes.step()?, 3, "taken branch adds one cycle");
    assert_eq!(nes.step()?, 2, "untaken branch stays at two");
    assert_eq!(nes.step()?, 3);
    Ok(())
}

#[test]
fn branch_across_page_costs_four_cycles() -> Result<()> {
    // Place a taken branch at the end of the page: the operand is fetched
    // from $80FE, leaving PC at $80FF; offset +$70 lands in $8100 territory.
    let mut nes = Nes::new();
    let rom = nrom_with_program(&[0xA2, 0x00, 0x4C, 0xFD, 0x80]) // LDX #0; JMP $80FD
        .prg_raw(0x00FD, &[0xF0, 0x70]) // $80FD: BEQ +$70
        .build();
    nes.load_rom(&rom)?;

    nes.step()?; // LDX
    nes.step()?; // JMP
    assert_eq!(nes.step()?, 4, "taken branch across a page costs two extra");
    assert_eq!(nes.cpu_snapshot().pc, 0x80FF + 0x70);
    Ok(())
}

#[test]
fn stack_wraps_within_page_one() -> Result<()> {
    // LDA #$AB; LDX #$00; TXS; PHA
    let mut nes = console_with(&[0xA9, 0xAB, 0xA2, 0x00, 0x9A, 0x48])?;

    for _ in 0..4 {
        nes.step()?;
    }

    assert_eq!(nes.peek_cpu_byte(0x0100), 0xAB, "push at SP=0 targets $0100");
    assert_eq!(nes.cpu_snapshot().s, 0xFF, "SP wraps to $FF");
    Ok(())
}

#[test]
fn jmp_indirect_page_wrap_bug() -> Result<()> {
    // Pointer at $02FF: low byte from $02FF, high byte from $0200 (not $0300).
    let mut nes = console_with(&[0x6C, 0xFF, 0x02])?;
    nes.poke_cpu_byte(0x02FF, 0x34);
    nes.poke_cpu_byte(0x0200, 0x12);
    nes.poke_cpu_byte(0x0300, 0x99);

    nes.step()?;
    assert_eq!(nes.cpu_snapshot().pc, 0x1234);
    Ok(())
}

#[test]
fn illegal_opcode_is_fatal_with_location() -> Result<()> {
    let mut nes = console_with(&[0x02])?;

    match nes.step() {
        Err(Error::IllegalOpcode { pc, opcode }) => {
            assert_eq!(pc, 0x8000);
            assert_eq!(opcode, 0x02);
        }
        other => panic!("expected IllegalOpcode, got {other:?}"),
    }
    Ok(())
}

#[test]
fn brk_and_rti_round_trip() -> Result<()> {
    // $8000: BRK (padding byte $8001); IRQ vector -> $9000: RTI
    let mut nes = Nes::new();
    let rom = RomBuilder::new(2, 1)
        .prg_raw(0, &[0x00, 0xFF, 0xEA]) // BRK, pad, NOP
        .prg_raw(0x1000, &[0x40]) // $9000: RTI
        .vector(0xFFFC, 0x8000)
        .vector(0xFFFE, 0x9000)
        .build();
    nes.load_rom(&rom)?;

    assert_eq!(nes.step()?, 7, "BRK takes seven cycles");
    assert_eq!(nes.cpu_snapshot().pc, 0x9000);

    assert_eq!(nes.step()?, 6, "RTI takes six cycles");
    // BRK pushes the address after its padding byte.
    assert_eq!(nes.cpu_snapshot().pc, 0x8002);
    Ok(())
}

#[test]
fn unused_status_bit_stays_set() -> Result<()> {
    // PHP; PLP; LDA #$00; PHA; PLP: shuffle P through the stack.
    let mut nes = console_with(&[0x08, 0x28, 0xA9, 0x00, 0x48, 0x28])?;
    for _ in 0..5 {
        nes.step()?;
    }
    assert_ne!(nes.cpu_snapshot().p & 0x20, 0, "U bit must read as 1");
    Ok(())
}

#[test]
fn adc_sets_carry_zero_and_overflow() -> Result<()> {
    // LDA #$7F; ADC #$01 -> A=$80, V set, C clear
    // LDA #$FF; ADC #$01 -> A=$00 (carry from before? CLC first)
    let mut nes = console_with(&[
        0x18, // CLC
        0xA9, 0x7F, // LDA #$7F
        0x69, 0x01, // ADC #$01
        0x08, // PHP (capture flags)
        0x18, // CLC
        0xA9, 0xFF, // LDA #$FF
        0x69, 0x01, // ADC #$01
    ])?;

    for _ in 0..4 {
        nes.step()?;
    }
    let after_overflow = nes.cpu_snapshot();
    assert_eq!(after_overflow.a, 0x80);
    assert_ne!(after_overflow.p & 0x40, 0, "V set on signed overflow");

    for _ in 0..3 {
        nes.step()?;
    }
    let after_carry = nes.cpu_snapshot();
    assert_eq!(after_carry.a, 0x00);
    assert_ne!(after_carry.p & 0x01, 0, "C set on unsigned carry");
    assert_ne!(after_carry.p & 0x02, 0, "Z set on zero result");
    Ok(())
}
