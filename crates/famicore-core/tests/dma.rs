//! OAM DMA timing and data transfer.

mod common;

use anyhow::Result;
use famicore_core::Nes;

use common::nrom_with_program;

fn fill_source_page(nes: &mut Nes) {
    for i in 0..=0xFFu16 {
        nes.poke_cpu_byte(0x0200 + i, (i as u8).wrapping_mul(3));
    }
}

fn oam_byte(nes: &mut Nes, index: u8) -> u8 {
    nes.poke_cpu_byte(0x2003, index);
    nes.peek_cpu_byte(0x2004)
}

#[test]
fn dma_from_even_cycle_takes_513() -> Result<()> {
    // LDA $00 is a 3-cycle instruction: 7 (reset) + 3 = 10, an even cycle.
    let mut nes = Nes::new();
    nes.load_rom(&nrom_with_program(&[0xA5, 0x00, 0xEA, 0xEA]).build())?;
    fill_source_page(&mut nes);

    nes.step()?;
    assert_eq!(nes.cpu_cycles() % 2, 0);

    let before = nes.cpu_snapshot();
    nes.poke_cpu_byte(0x4014, 0x02);
    assert_eq!(nes.step()?, 513);

    // Registers are untouched by the stall.
    let after = nes.cpu_snapshot();
    assert_eq!(before, after);

    for i in 0..=0xFFu8 {
        assert_eq!(oam_byte(&mut nes, i), i.wrapping_mul(3));
    }
    Ok(())
}

#[test]
fn dma_from_odd_cycle_takes_514() -> Result<()> {
    // Straight after reset the cycle counter sits at 7: odd.
    let mut nes = Nes::new();
    nes.load_rom(&nrom_with_program(&[0xEA, 0xEA]).build())?;
    fill_source_page(&mut nes);

    assert_eq!(nes.cpu_cycles() % 2, 1);
    nes.poke_cpu_byte(0x4014, 0x02);
    assert_eq!(nes.step()?, 514);
    Ok(())
}

#[test]
fn dma_respects_the_current_oam_addr() -> Result<()> {
    let mut nes = Nes::new();
    nes.load_rom(&nrom_with_program(&[0xEA, 0xEA]).build())?;
    fill_source_page(&mut nes);

    // Transfers go through the $2004 port, so they start at OAMADDR.
    nes.poke_cpu_byte(0x2003, 0x10);
    nes.poke_cpu_byte(0x4014, 0x02);
    nes.step()?;

    assert_eq!(oam_byte(&mut nes, 0x10), 0);
    assert_eq!(oam_byte(&mut nes, 0x11), 3);
    Ok(())
}
