//! Sprite-0 hit detection against an opaque background.

mod common;

use anyhow::Result;
use famicore_core::Nes;

use common::nrom_with_program;

/// Builds a console where tile 0 is fully opaque, the whole nametable uses
/// tile 0, and sprite 0 sits at (32, 16) with an opaque pattern.
fn console(mask: u8) -> Result<Nes> {
    let rom = nrom_with_program(&[0x4C, 0x00, 0x80]) // spin
        .chr_tile(0, 0xFF, 0x00) // color 1 everywhere: opaque
        .build();

    let mut nes = Nes::new();
    nes.load_rom(&rom)?;

    // Sprite 0: Y=16, tile 0, no attributes, X=32.
    nes.poke_cpu_byte(0x2003, 0x00);
    for byte in [16, 0, 0, 32] {
        nes.poke_cpu_byte(0x2004, byte);
    }

    // Palette entries so the opaque pixels resolve to visible colors.
    nes.poke_cpu_byte(0x2006, 0x3F);
    nes.poke_cpu_byte(0x2006, 0x00);
    for color in [0x0F, 0x20, 0x10, 0x00] {
        nes.poke_cpu_byte(0x2007, color);
    }

    nes.poke_cpu_byte(0x2001, mask);
    Ok(nes)
}

fn run_until_dot(nes: &mut Nes, scanline: i16, dot: u16) -> Result<()> {
    loop {
        nes.step()?;
        let past_line = nes.ppu().scanline() > scanline;
        let past_dot = nes.ppu().scanline() == scanline && nes.ppu().dot() >= dot;
        if past_line || past_dot {
            return Ok(());
        }
    }
}

#[test]
fn hit_fires_where_sprite_overlaps_background() -> Result<()> {
    // Background + sprites on, left columns visible.
    let mut nes = console(0b0001_1110)?;

    run_until_dot(&mut nes, 16, 340)?;
    let status = nes.peek_cpu_byte(0x2002);
    assert_ne!(status & 0x40, 0, "sprite-0 hit flag should be set");
    Ok(())
}

#[test]
fn no_hit_with_sprites_disabled() -> Result<()> {
    // Background only.
    let mut nes = console(0b0000_1010)?;

    run_until_dot(&mut nes, 16, 340)?;
    let status = nes.peek_cpu_byte(0x2002);
    assert_eq!(status & 0x40, 0, "no sprites, no hit");
    Ok(())
}

#[test]
fn no_hit_before_the_sprite_line() -> Result<()> {
    let mut nes = console(0b0001_1110)?;

    run_until_dot(&mut nes, 14, 340)?;
    let status = nes.peek_cpu_byte(0x2002);
    assert_eq!(status & 0x40, 0, "hit cannot precede the sprite's scanline");
    Ok(())
}

#[test]
fn hit_persists_through_vblank() -> Result<()> {
    let mut nes = console(0b0001_1110)?;

    run_until_dot(&mut nes, 120, 0)?;
    assert_ne!(nes.peek_cpu_byte(0x2002) & 0x40, 0, "still set mid-frame");

    // Status reads clear VBlank but never bit 6; it survives into vblank
    // and only prerender dot 1 drops it.
    run_until_dot(&mut nes, 255, 0)?;
    assert_ne!(nes.peek_cpu_byte(0x2002) & 0x40, 0, "still set in vblank");
    Ok(())
}
