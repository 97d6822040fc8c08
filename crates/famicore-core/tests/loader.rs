//! Loader-level behaviour and the bus-visible round-trip laws.

mod common;

use anyhow::Result;
use famicore_core::{error::Error, Nes};

use common::{nrom_with_program, RomBuilder};

#[test]
fn ram_mirrors_across_the_whole_window() -> Result<()> {
    let mut nes = Nes::new();
    nes.load_rom(&nrom_with_program(&[0x4C, 0x00, 0x80]).build())?;

    for addr in [0x0000u16, 0x0123, 0x07FF] {
        nes.poke_cpu_byte(addr, 0x5A);
        assert_eq!(nes.peek_cpu_byte(addr ^ 0x0800), 0x5A);
        assert_eq!(nes.peek_cpu_byte(addr ^ 0x1000), 0x5A);
        assert_eq!(nes.peek_cpu_byte(addr ^ 0x1800), 0x5A);
    }
    Ok(())
}

#[test]
fn ppuaddr_ppudata_round_trip_with_both_increments() -> Result<()> {
    let mut nes = Nes::new();
    nes.load_rom(&nrom_with_program(&[0x4C, 0x00, 0x80]).build())?;

    // Increment of 1.
    nes.poke_cpu_byte(0x2006, 0x20);
    nes.poke_cpu_byte(0x2006, 0x00);
    nes.poke_cpu_byte(0x2007, 0x11);
    nes.poke_cpu_byte(0x2007, 0x22);

    nes.poke_cpu_byte(0x2006, 0x20);
    nes.poke_cpu_byte(0x2006, 0x00);
    let _ = nes.peek_cpu_byte(0x2007); // prime the read buffer
    assert_eq!(nes.peek_cpu_byte(0x2007), 0x11);
    assert_eq!(nes.peek_cpu_byte(0x2007), 0x22);

    // Increment of 32 (PPUCTRL bit 2).
    nes.poke_cpu_byte(0x2000, 0x04);
    nes.poke_cpu_byte(0x2006, 0x20);
    nes.poke_cpu_byte(0x2006, 0x40);
    nes.poke_cpu_byte(0x2007, 0x33); // $2040
    nes.poke_cpu_byte(0x2007, 0x44); // $2060

    nes.poke_cpu_byte(0x2000, 0x00);
    nes.poke_cpu_byte(0x2006, 0x20);
    nes.poke_cpu_byte(0x2006, 0x60);
    let _ = nes.peek_cpu_byte(0x2007);
    assert_eq!(nes.peek_cpu_byte(0x2007), 0x44);
    Ok(())
}

#[test]
fn nametable_mirroring_follows_the_header_bit() -> Result<()> {
    // Vertical mirroring: $2000 and $2800 share storage.
    let rom = nrom_with_program(&[0x4C, 0x00, 0x80])
        .vertical_mirroring()
        .build();
    let mut nes = Nes::new();
    nes.load_rom(&rom)?;

    nes.poke_cpu_byte(0x2006, 0x20);
    nes.poke_cpu_byte(0x2006, 0x05);
    nes.poke_cpu_byte(0x2007, 0x77);

    nes.poke_cpu_byte(0x2006, 0x28);
    nes.poke_cpu_byte(0x2006, 0x05);
    let _ = nes.peek_cpu_byte(0x2007);
    assert_eq!(nes.peek_cpu_byte(0x2007), 0x77);
    Ok(())
}

#[test]
fn identical_images_produce_identical_bus_views() -> Result<()> {
    let rom = RomBuilder::new(1, 1)
        .mapper(3)
        .prg_raw(0, &[0xA9, 0x01, 0x4C, 0x02, 0x80])
        .vector(0xFFFC, 0x8000)
        .build();

    let mut first = Nes::new();
    first.load_rom(&rom)?;
    let mut second = Nes::new();
    second.load_rom(&rom)?;

    for addr in (0x8000u16..=0xFFFF).step_by(0x111) {
        assert_eq!(first.peek_cpu_byte(addr), second.peek_cpu_byte(addr));
    }
    Ok(())
}

#[test]
fn chr_ram_boards_accept_ppu_writes() -> Result<()> {
    // CHR bank count 0 allocates 8 KiB of CHR-RAM.
    let rom = RomBuilder::new(2, 0)
        .prg_raw(0, &[0x4C, 0x00, 0x80])
        .vector(0xFFFC, 0x8000)
        .build();
    let mut nes = Nes::new();
    nes.load_rom(&rom)?;

    nes.poke_cpu_byte(0x2006, 0x00);
    nes.poke_cpu_byte(0x2006, 0x10);
    nes.poke_cpu_byte(0x2007, 0xAB);

    nes.poke_cpu_byte(0x2006, 0x00);
    nes.poke_cpu_byte(0x2006, 0x10);
    let _ = nes.peek_cpu_byte(0x2007);
    assert_eq!(nes.peek_cpu_byte(0x2007), 0xAB);
    Ok(())
}

#[test]
fn unsupported_mapper_is_rejected_at_load() {
    let rom = RomBuilder::new(1, 1).mapper(9).build();
    let mut nes = Nes::new();
    match nes.load_rom(&rom) {
        Err(Error::UnsupportedMapper(9)) => {}
        other => panic!("expected UnsupportedMapper, got {other:?}"),
    }
}

#[test]
fn truncated_image_is_rejected() {
    let mut rom = RomBuilder::new(2, 1).build();
    rom.truncate(16 + 1024);
    let mut nes = Nes::new();
    assert!(matches!(
        nes.load_rom(&rom),
        Err(Error::SectionTooShort { .. })
    ));
}
