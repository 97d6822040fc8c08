//! MMC3 scanline IRQ delivered through the CPU IRQ line.

mod common;

use anyhow::Result;
use famicore_core::Nes;

use common::RomBuilder;

#[test]
fn scanline_counter_reaches_the_irq_handler() -> Result<()> {
    // Program lives in the fixed last bank:
    //   $E000: CLI
    //   $E001: JMP $E001
    // IRQ handler at $E010: JMP $E010.
    let rom = RomBuilder::new(2, 1)
        .mapper(4)
        .prg_at_top(0xE000, &[0x58, 0x4C, 0x01, 0xE0])
        .prg_at_top(0xE010, &[0x4C, 0x10, 0xE0])
        .vector(0xFFFC, 0xE000)
        .vector(0xFFFE, 0xE010)
        .build();

    let mut nes = Nes::new();
    nes.load_rom(&rom)?;

    // Program the board: latch = 8, reload, enable IRQ, enable rendering.
    nes.poke_cpu_byte(0xC000, 8);
    nes.poke_cpu_byte(0xC001, 0);
    nes.poke_cpu_byte(0xE001, 0);
    nes.poke_cpu_byte(0x2001, 0x18);

    nes.run_frame()?;

    let pc = nes.cpu_snapshot().pc;
    assert!(
        (0xE010..0xE013).contains(&pc),
        "expected the IRQ handler, PC = {pc:#06X}"
    );
    Ok(())
}

#[test]
fn irq_stays_masked_while_i_is_set() -> Result<()> {
    // Same board setup, but the program never executes CLI.
    let rom = RomBuilder::new(2, 1)
        .mapper(4)
        .prg_at_top(0xE000, &[0x4C, 0x00, 0xE0])
        .prg_at_top(0xE010, &[0x4C, 0x10, 0xE0])
        .vector(0xFFFC, 0xE000)
        .vector(0xFFFE, 0xE010)
        .build();

    let mut nes = Nes::new();
    nes.load_rom(&rom)?;

    nes.poke_cpu_byte(0xC000, 8);
    nes.poke_cpu_byte(0xC001, 0);
    nes.poke_cpu_byte(0xE001, 0);
    nes.poke_cpu_byte(0x2001, 0x18);

    nes.run_frame()?;

    let pc = nes.cpu_snapshot().pc;
    assert!(
        (0xE000..0xE003).contains(&pc),
        "IRQ must not be taken with I set, PC = {pc:#06X}"
    );
    Ok(())
}

#[test]
fn disabling_ack_clears_the_line() -> Result<()> {
    let rom = RomBuilder::new(2, 1)
        .mapper(4)
        .prg_at_top(0xE000, &[0x4C, 0x00, 0xE0])
        .vector(0xFFFC, 0xE000)
        .vector(0xFFFE, 0xE000)
        .build();

    let mut nes = Nes::new();
    nes.load_rom(&rom)?;

    nes.poke_cpu_byte(0xC000, 2);
    nes.poke_cpu_byte(0xC001, 0);
    nes.poke_cpu_byte(0xE001, 0);
    nes.poke_cpu_byte(0x2001, 0x18);

    nes.run_frame()?;
    assert!(nes.cartridge().expect("cartridge").irq_pending());

    // $E000 disables and acknowledges.
    nes.poke_cpu_byte(0xE000, 0);
    assert!(!nes.cartridge().expect("cartridge").irq_pending());
    Ok(())
}
