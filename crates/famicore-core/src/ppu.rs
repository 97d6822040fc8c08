//! 2C02 Picture Processing Unit with dot-level timing.
//!
//! A quick map of the frame:
//! - Scanline `-1` is the prerender line, `0..=239` are visible, `240` is
//!   the post-render idle line, `241..=260` are vblank. Each scanline has
//!   341 dots; on odd frames with rendering enabled the prerender line
//!   drops one dot.
//! - The CPU sees eight registers at `$2000-$2007` (mirrored through
//!   `$3FFF`). Most PPU state lives in small internal latches and shift
//!   registers; mirroring that is what makes some code here look odd.
//! - Background and sprites are separate pipelines. Each pushes out one
//!   pixel per dot from its shifters while fetch logic refills them.
//!
//! The picture bus decode (`$0000-$3FFF` wrap, nametable mirroring, the
//! palette alias rules) lives in `read_memory`/`write_memory`; pattern
//! table traffic goes through the borrowed [`PictureBus`] so the mapper
//! can observe and bank it.

mod background_pipeline;
pub mod palette;
mod registers;
mod sprite;
mod sprite_pipeline;
mod sprite_state;

use tracing::trace;

use crate::{
    bus::PictureBus,
    cartridge::header::Mirroring,
    memory::ppu::{self as ppu_mem, Register as PpuRegister},
    ppu::{
        background_pipeline::BgPipeline,
        palette::{PaletteRam, SCREEN_HEIGHT, SCREEN_WIDTH},
        registers::{Mask, Registers, Status},
        sprite_pipeline::SpritePipeline,
        sprite_state::{SpriteEvalPhase, SpriteEvalState, SpriteFetchState, SpriteLineBuffers},
    },
    ram::ppu::{NametableRam, SecondaryOamRam},
};

const DOTS_PER_SCANLINE: u16 = 341;
const PRERENDER_SCANLINE: i16 = -1;
const LAST_SCANLINE: i16 = 260;
/// Dot at which the mapper's scanline clock fires on rendering lines.
const MAPPER_TICK_DOT: u16 = 260;

#[derive(Debug)]
pub struct Ppu {
    /// CPU-visible registers and their helper latches.
    registers: Registers,
    /// Physical nametable RAM (four logical tables resolved via mirroring).
    nametables: NametableRam,
    /// Palette RAM with the `$3F10/$14/$18/$1C` alias rules.
    palette_ram: PaletteRam,

    /// Current dot (0..=340) within the active scanline.
    cycle: u16,
    /// Current scanline. `-1` is prerender, `0..=239` are visible.
    scanline: i16,
    /// Completed frame counter.
    frame: u64,
    /// Odd-frame toggle for the prerender dot skip.
    odd_frame: bool,
    /// Latched when a frame completes; consumed by the emulator loop.
    frame_ready: bool,

    bg_pipeline: BgPipeline,
    /// Latches filled by the interleaved background fetches (sub-dots 0-7).
    nt_latch: u8,
    at_latch: u8,
    pattern_lo_latch: u8,
    pattern_hi_latch: u8,

    sprite_pipeline: SpritePipeline,
    secondary_oam: SecondaryOamRam,
    sprite_eval: SpriteEvalState,
    sprite_fetch: SpriteFetchState,
    sprite_line_next: SpriteLineBuffers,

    /// Latched NMI request; consumed by the emulator loop via `take_nmi`.
    nmi_pending: bool,
    /// Current level of the NMI output line (VBlank && NMI enable).
    nmi_output: bool,
    /// `$2002` race: a read close to the VBlank edge eats flag and NMI.
    suppress_vblank: bool,

    framebuffer: Box<[u8; SCREEN_WIDTH * SCREEN_HEIGHT]>,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            nametables: NametableRam::new(),
            palette_ram: PaletteRam::new(),
            cycle: 0,
            scanline: PRERENDER_SCANLINE,
            frame: 0,
            odd_frame: false,
            frame_ready: false,
            bg_pipeline: BgPipeline::default(),
            nt_latch: 0,
            at_latch: 0,
            pattern_lo_latch: 0,
            pattern_hi_latch: 0,
            sprite_pipeline: SpritePipeline::new(),
            secondary_oam: SecondaryOamRam::new(),
            sprite_eval: SpriteEvalState::default(),
            sprite_fetch: SpriteFetchState::default(),
            sprite_line_next: SpriteLineBuffers::new(),
            nmi_pending: false,
            nmi_output: false,
            suppress_vblank: false,
            framebuffer: vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT]
                .into_boxed_slice()
                .try_into()
                .expect("framebuffer length"),
        }
    }

    /// Restores the device to its power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current scanline (`-1..=260`). Exposed for tests and tracing.
    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    /// Current dot within the scanline (`0..=340`).
    pub fn dot(&self) -> u16 {
        self.cycle
    }

    /// Completed frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Consumes the frame-complete latch.
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    /// Consumes a pending NMI edge.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// The 256x240 picture as master-palette indices (0..=63). Stable from
    /// frame-ready until the next tick.
    pub fn framebuffer(&self) -> &[u8] {
        self.framebuffer.as_slice()
    }

    // ------------------------------------------------------------------
    // CPU register interface
    // ------------------------------------------------------------------

    /// Handles CPU writes to the mirrored register space (`$2000-$3FFF`).
    pub fn cpu_write(&mut self, addr: u16, value: u8, picture: &mut PictureBus<'_>) {
        match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Control => {
                let prev_output = self.nmi_output;
                self.registers.write_control(value);
                self.update_nmi_output(prev_output);
            }
            PpuRegister::Mask => self.registers.mask = Mask::from_bits_retain(value),
            PpuRegister::Status => {} // read-only
            PpuRegister::OamAddr => self.registers.oam_addr = value,
            PpuRegister::OamData => self.write_oam_data(value),
            PpuRegister::Scroll => self.registers.vram.write_scroll(value),
            PpuRegister::Addr => self.registers.vram.write_addr(value),
            PpuRegister::Data => self.write_vram_data(value, picture),
        }
    }

    /// Handles CPU reads from the mirrored register space. Write-only
    /// registers read back 0.
    pub fn cpu_read(&mut self, addr: u16, picture: &mut PictureBus<'_>) -> u8 {
        match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Status => self.read_status(),
            PpuRegister::OamData => self.read_oam_data(),
            PpuRegister::Data => self.read_vram_data(picture),
            _ => 0,
        }
    }

    fn read_status(&mut self) -> u8 {
        // Race window: a read landing within two dots of the VBlank edge
        // sees the flag clear and loses that frame's NMI.
        if self.scanline == 241 && self.cycle <= 2 {
            self.suppress_vblank = true;
            self.registers.status.remove(Status::VERTICAL_BLANK);
            self.nmi_pending = false;
        }

        let prev_output = self.nmi_output;
        let status = self.registers.status.bits();
        self.registers.status.remove(Status::VERTICAL_BLANK);
        self.registers.vram.reset_latch();
        self.update_nmi_output(prev_output);
        status
    }

    fn write_oam_data(&mut self, value: u8) {
        let idx = usize::from(self.registers.oam_addr);
        self.registers.oam[idx] = value;
        self.registers.oam_addr = self.registers.oam_addr.wrapping_add(1);
    }

    fn read_oam_data(&self) -> u8 {
        let rendering = self.registers.mask.rendering_enabled() && self.scanline < 240;
        if rendering {
            // Primary OAM is not exposed mid-render; approximate the
            // internal bus value.
            0xFF
        } else {
            self.registers.oam[usize::from(self.registers.oam_addr)]
        }
    }

    fn write_vram_data(&mut self, value: u8, picture: &mut PictureBus<'_>) {
        let addr = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
        self.write_memory(picture, addr, value);
        let increment = self.registers.control.vram_increment();
        self.registers.vram.v.increment(increment);
    }

    fn read_vram_data(&mut self, picture: &mut PictureBus<'_>) -> u8 {
        let addr = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
        let increment = self.registers.control.vram_increment();
        self.registers.vram.v.increment(increment);

        if addr >= ppu_mem::PALETTE_BASE {
            // Palette reads bypass the buffer; the buffer still picks up
            // the nametable byte that shares the address lines.
            let grayscale = self.registers.mask.contains(Mask::GRAYSCALE);
            let value = self.palette_ram.read(addr, grayscale);
            self.registers.vram_buffer = self.read_memory(picture, addr & 0x2FFF);
            value
        } else {
            let buffered = self.registers.vram_buffer;
            self.registers.vram_buffer = self.read_memory(picture, addr);
            buffered
        }
    }

    // ------------------------------------------------------------------
    // Picture bus decode
    // ------------------------------------------------------------------

    fn read_memory(&mut self, picture: &mut PictureBus<'_>, addr: u16) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        if addr >= ppu_mem::PALETTE_BASE {
            let grayscale = self.registers.mask.contains(Mask::GRAYSCALE);
            self.palette_ram.read(addr, grayscale)
        } else if addr <= ppu_mem::PATTERN_TABLE_END {
            picture.read_chr(addr)
        } else {
            let idx = nametable_index(picture.mirroring(), addr);
            self.nametables[idx]
        }
    }

    fn write_memory(&mut self, picture: &mut PictureBus<'_>, addr: u16, value: u8) {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        if addr >= ppu_mem::PALETTE_BASE {
            self.palette_ram.write(addr, value);
        } else if addr <= ppu_mem::PATTERN_TABLE_END {
            picture.write_chr(addr, value);
        } else {
            let idx = nametable_index(picture.mirroring(), addr);
            self.nametables[idx] = value;
        }
    }

    // ------------------------------------------------------------------
    // Dot clock
    // ------------------------------------------------------------------

    /// Advances the PPU by a single dot. Called three times per CPU cycle.
    pub fn clock(&mut self, picture: &mut PictureBus<'_>) {
        let rendering_enabled = self.registers.mask.rendering_enabled();

        // Odd-frame skip: the prerender line loses dot 0, leaving 340 dots.
        if self.scanline == PRERENDER_SCANLINE
            && self.cycle == 0
            && self.odd_frame
            && rendering_enabled
        {
            self.cycle = 1;
        }

        if self.scanline == PRERENDER_SCANLINE && self.cycle == 1 {
            self.registers.status.remove(
                Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW,
            );
            self.suppress_vblank = false;
            self.nmi_output = false;
            self.nmi_pending = false;
        }

        let on_render_line = self.scanline < 240; // includes prerender (-1)

        if on_render_line {
            // Load the sprite shifters selected by the previous line's
            // evaluation before this line's first pixel.
            if self.cycle == 1 && self.scanline >= 0 {
                self.sprite_pipeline.load_scanline(
                    self.sprite_eval.count,
                    self.sprite_eval.sprite0_in_range,
                    &self.sprite_line_next.attrs,
                    &self.sprite_line_next.xs,
                    &self.sprite_line_next.pattern_low,
                    &self.sprite_line_next.pattern_high,
                );
            }

            if rendering_enabled {
                self.background_tick(picture);
                self.sprite_eval_tick();
                self.sprite_fetch_tick(picture);

                if self.cycle == MAPPER_TICK_DOT {
                    picture.tick_scanline();
                }
            }

            if self.scanline >= 0 && (1..=256).contains(&self.cycle) {
                self.render_pixel();
            }
        }

        if self.scanline == 241 && self.cycle == 1 {
            let prev_output = self.nmi_output;
            if !self.suppress_vblank {
                self.registers.status.insert(Status::VERTICAL_BLANK);
            }
            self.update_nmi_output(prev_output);
            trace!(frame = self.frame, suppressed = self.suppress_vblank, "vblank start");
        }

        self.advance_dot();
    }

    fn advance_dot(&mut self) {
        self.cycle += 1;
        if self.cycle >= DOTS_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > LAST_SCANLINE {
                self.scanline = PRERENDER_SCANLINE;
                self.frame = self.frame.wrapping_add(1);
                self.odd_frame = !self.odd_frame;
                self.frame_ready = true;
            }
        }
    }

    /// Recomputes the NMI output line (VBlank && enable), latching a
    /// pending NMI on the rising edge.
    fn update_nmi_output(&mut self, prev_output: bool) {
        self.nmi_output = self.registers.status.contains(Status::VERTICAL_BLANK)
            && self.registers.control.nmi_enabled();
        if self.nmi_output && !prev_output {
            self.nmi_pending = true;
        }
    }

    // ------------------------------------------------------------------
    // Background pipeline
    // ------------------------------------------------------------------

    /// One dot of the interleaved background fetch/shift schedule.
    fn background_tick(&mut self, picture: &mut PictureBus<'_>) {
        let fetch_window = (1..=256).contains(&self.cycle) || (321..=336).contains(&self.cycle);
        let shift_window = (2..=257).contains(&self.cycle) || (322..=337).contains(&self.cycle);

        if shift_window {
            self.bg_pipeline.shift();
        }

        if fetch_window {
            match (self.cycle - 1) % 8 {
                0 => {
                    self.bg_pipeline
                        .reload([self.pattern_lo_latch, self.pattern_hi_latch], self.at_latch);
                    self.nt_latch = self.fetch_nametable_byte(picture);
                }
                2 => self.at_latch = self.fetch_attribute_bits(picture),
                4 => self.pattern_lo_latch = self.fetch_pattern_byte(picture, 0),
                6 => self.pattern_hi_latch = self.fetch_pattern_byte(picture, 8),
                7 => self.increment_scroll_x(),
                _ => {}
            }
        }

        if self.cycle == 256 {
            self.increment_scroll_y();
        }
        if self.cycle == 257 {
            self.bg_pipeline
                .reload([self.pattern_lo_latch, self.pattern_hi_latch], self.at_latch);
            self.copy_horizontal_scroll();
        }
        if self.scanline == PRERENDER_SCANLINE && (280..=304).contains(&self.cycle) {
            self.copy_vertical_scroll();
        }
    }

    fn fetch_nametable_byte(&mut self, picture: &mut PictureBus<'_>) -> u8 {
        let v = self.registers.vram.v;
        let addr = ppu_mem::NAMETABLE_BASE | (v.raw() & 0x0FFF);
        self.read_memory(picture, addr)
    }

    /// Reads the attribute byte for the current tile and extracts the two
    /// palette bits of its quadrant.
    fn fetch_attribute_bits(&mut self, picture: &mut PictureBus<'_>) -> u8 {
        let v = self.registers.vram.v;
        let addr = ppu_mem::NAMETABLE_BASE
            + u16::from(v.nametable()) * ppu_mem::NAMETABLE_SIZE
            + 0x03C0
            + (u16::from(v.coarse_y()) / 4) * 8
            + u16::from(v.coarse_x()) / 4;
        let attr = self.read_memory(picture, addr);
        let quadrant_shift = ((v.coarse_y() & 0b10) << 1) | (v.coarse_x() & 0b10);
        (attr >> quadrant_shift) & 0b11
    }

    fn fetch_pattern_byte(&mut self, picture: &mut PictureBus<'_>, plane: u16) -> u8 {
        let v = self.registers.vram.v;
        let base = self.registers.control.background_pattern_table();
        let addr = base + u16::from(self.nt_latch) * 16 + u16::from(v.fine_y()) + plane;
        self.read_memory(picture, addr)
    }

    /// Increments coarse X in `v`, wrapping into the neighbour nametable.
    fn increment_scroll_x(&mut self) {
        let v = &mut self.registers.vram.v;
        if v.coarse_x() == 31 {
            v.set_coarse_x(0);
            let nt = v.nametable() ^ 0b01;
            v.set_nametable(nt);
        } else {
            let cx = v.coarse_x() + 1;
            v.set_coarse_x(cx);
        }
    }

    /// Increments fine Y in `v`, rolling into coarse Y. Row 29 wraps and
    /// flips the vertical nametable; row 31 wraps without flipping (the
    /// attribute rows behave that way on hardware).
    fn increment_scroll_y(&mut self) {
        let v = &mut self.registers.vram.v;
        let fine_y = v.fine_y();
        if fine_y < 7 {
            v.set_fine_y(fine_y + 1);
            return;
        }

        v.set_fine_y(0);
        match v.coarse_y() {
            29 => {
                v.set_coarse_y(0);
                let nt = v.nametable() ^ 0b10;
                v.set_nametable(nt);
            }
            31 => v.set_coarse_y(0),
            cy => v.set_coarse_y(cy + 1),
        }
    }

    /// Copies the horizontal bits of `t` into `v` (dot 257).
    fn copy_horizontal_scroll(&mut self) {
        let t = self.registers.vram.t;
        let v = &mut self.registers.vram.v;
        v.set_coarse_x(t.coarse_x());
        let nt = (v.nametable() & 0b10) | (t.nametable() & 0b01);
        v.set_nametable(nt);
    }

    /// Copies the vertical bits of `t` into `v` (prerender dots 280-304).
    fn copy_vertical_scroll(&mut self) {
        let t = self.registers.vram.t;
        let v = &mut self.registers.vram.v;
        v.set_fine_y(t.fine_y());
        v.set_coarse_y(t.coarse_y());
        let nt = (v.nametable() & 0b01) | (t.nametable() & 0b10);
        v.set_nametable(nt);
    }

    // ------------------------------------------------------------------
    // Sprite pipeline
    // ------------------------------------------------------------------

    /// Dots 1..=64 clear secondary OAM; dots 65..=256 scan primary OAM for
    /// sprites covering the next scanline.
    fn sprite_eval_tick(&mut self) {
        match self.cycle {
            // Two dots per byte: 32 bytes cleared across dots 1..=64.
            1..=64 => {
                if self.cycle % 2 == 1 {
                    let byte_index = usize::from((self.cycle - 1) / 2);
                    self.secondary_oam[byte_index] = 0xFF;
                }
            }
            65..=256 => self.evaluate_sprites_for_dot(),
            _ => {}
        }
    }

    fn evaluate_sprites_for_dot(&mut self) {
        if self.cycle == 65 {
            self.sprite_eval = SpriteEvalState::default();
        }

        // Evaluation advances once per OAM byte, i.e. every second dot.
        if (self.cycle - 65) % 2 == 0 {
            return;
        }
        if self.sprite_eval.n >= 64 {
            return;
        }

        let next_scanline = self.scanline + 1;
        let sprite_height = self.registers.control.sprite_height();

        let base = usize::from(self.sprite_eval.n) * 4;
        let y = i16::from(self.registers.oam[base]);

        match self.sprite_eval.phase {
            SpriteEvalPhase::ScanY => {
                let in_range = next_scanline >= y && next_scanline < y + sprite_height;
                if in_range {
                    if self.sprite_eval.count < 8 {
                        // Copy byte 0 now; bytes 1..=3 follow on later dots.
                        self.secondary_oam[usize::from(self.sprite_eval.sec_idx)] =
                            self.registers.oam[base];
                        self.sprite_eval.sec_idx += 1;
                        self.sprite_eval.m = 1;
                        self.sprite_eval.phase = SpriteEvalPhase::CopyRest;
                        if self.sprite_eval.n == 0 {
                            self.sprite_eval.sprite0_in_range = true;
                        }
                    } else {
                        // Ninth in-range sprite: enter the buggy overflow
                        // scan instead of a clean "stop here".
                        self.sprite_eval.phase = SpriteEvalPhase::OverflowScan;
                        self.sprite_eval.m = 0;
                    }
                } else {
                    self.sprite_eval.n += 1;
                }
            }

            SpriteEvalPhase::CopyRest => {
                let byte = self.registers.oam[base + usize::from(self.sprite_eval.m)];
                if self.sprite_eval.sec_idx < 32 {
                    self.secondary_oam[usize::from(self.sprite_eval.sec_idx)] = byte;
                    self.sprite_eval.sec_idx += 1;
                }
                self.sprite_eval.m += 1;

                if self.sprite_eval.m >= 4 {
                    self.sprite_eval.m = 0;
                    self.sprite_eval.count += 1;
                    self.sprite_eval.n += 1;
                    self.sprite_eval.phase = SpriteEvalPhase::ScanY;
                }
            }

            SpriteEvalPhase::OverflowScan => {
                // Hardware bug: the Y test only happens when m == 0, but m
                // keeps walking alongside n, so the scan samples the wrong
                // bytes of most entries.
                if self.sprite_eval.m == 0 {
                    let in_range = next_scanline >= y && next_scanline < y + sprite_height;
                    if in_range {
                        self.registers.status.insert(Status::SPRITE_OVERFLOW);
                    }
                }
                self.sprite_eval.m = (self.sprite_eval.m + 1) & 0b11;
                if self.sprite_eval.m == 0 {
                    self.sprite_eval.n += 1;
                }
            }
        }
    }

    /// Dots 257..=320: eight 8-dot fetch slots, one per secondary OAM entry.
    fn sprite_fetch_tick(&mut self, picture: &mut PictureBus<'_>) {
        if !(257..=320).contains(&self.cycle) {
            return;
        }
        if self.cycle == 257 {
            self.sprite_fetch = SpriteFetchState::default();
            self.sprite_line_next.clear();
        }

        let slot = usize::from((self.cycle - 257) / 8);
        let sub = (self.cycle - 257) % 8;
        if slot >= usize::from(self.sprite_eval.count.min(8)) {
            return;
        }

        let base = slot * 4;
        let y = self.secondary_oam[base];
        let tile = self.secondary_oam[base + 1];
        let attr = self.secondary_oam[base + 2];
        let x = self.secondary_oam[base + 3];

        if sub == 0 {
            self.sprite_line_next.attrs[slot] = attr;
            self.sprite_line_next.xs[slot] = x;
        }

        // Which pattern row the next scanline needs, honouring V-flip.
        let next_scanline = self.scanline + 1;
        let sprite_height = self.registers.control.sprite_height();
        let mut row = (next_scanline - i16::from(y)).clamp(0, sprite_height - 1);
        if attr & 0x80 != 0 {
            row = sprite_height - 1 - row;
        }

        let (pattern_base, tile_index) = if sprite_height == 16 {
            // 8x16: tile bit 0 selects the table, the row picks the half.
            let table = if tile & 0x01 != 0 {
                ppu_mem::PATTERN_TABLE_1
            } else {
                ppu_mem::PATTERN_TABLE_0
            };
            let top = tile & 0xFE;
            let index = if row < 8 { top } else { top.wrapping_add(1) };
            (table, index)
        } else {
            (self.registers.control.sprite_pattern_table(), tile)
        };

        let addr = pattern_base + u16::from(tile_index) * 16 + (row & 7) as u16;
        if sub == 4 {
            self.sprite_line_next.pattern_low[slot] = self.read_memory(picture, addr);
        }
        if sub == 6 {
            self.sprite_line_next.pattern_high[slot] = self.read_memory(picture, addr + 8);
        }
    }

    // ------------------------------------------------------------------
    // Pixel multiplexer
    // ------------------------------------------------------------------

    /// Produces one framebuffer pixel from the background and sprite
    /// pipelines, resolving priority and the sprite-0 hit.
    fn render_pixel(&mut self) {
        let x = usize::from(self.cycle - 1);
        let y = self.scanline as usize;
        let mask = self.registers.mask;

        let (mut bg_palette, mut bg_color) = if mask.contains(Mask::SHOW_BACKGROUND) {
            self.bg_pipeline.sample(self.registers.vram.x)
        } else {
            (0, 0)
        };
        if x < 8 && !mask.contains(Mask::SHOW_BACKGROUND_LEFT) {
            bg_palette = 0;
            bg_color = 0;
        }

        let mut sprite = self.sprite_pipeline.sample_and_shift();
        if !mask.contains(Mask::SHOW_SPRITES) || (x < 8 && !mask.contains(Mask::SHOW_SPRITES_LEFT))
        {
            sprite.color = 0;
        }

        let bg_opaque = bg_color != 0;
        let sprite_opaque = sprite.color != 0;

        // Sprite 0 hit: both layers opaque with sprite 0 contributing, not
        // in the rightmost column (the hardware never reports x=255).
        if bg_opaque && sprite_opaque && sprite.is_sprite0 && self.cycle != 256 {
            if !self.registers.status.contains(Status::SPRITE_ZERO_HIT) {
                trace!(scanline = self.scanline, dot = self.cycle, "sprite 0 hit");
            }
            self.registers.status.insert(Status::SPRITE_ZERO_HIT);
        }

        let palette_addr = match (bg_opaque, sprite_opaque) {
            (false, false) => ppu_mem::PALETTE_BASE,
            (false, true) => sprite_palette_addr(sprite.palette, sprite.color),
            (true, false) => bg_palette_addr(bg_palette, bg_color),
            (true, true) => {
                if sprite.priority_behind_bg {
                    bg_palette_addr(bg_palette, bg_color)
                } else {
                    sprite_palette_addr(sprite.palette, sprite.color)
                }
            }
        };

        let grayscale = mask.contains(Mask::GRAYSCALE);
        self.framebuffer[y * SCREEN_WIDTH + x] = self.palette_ram.read(palette_addr, grayscale);
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bg_palette_addr(palette: u8, color: u8) -> u16 {
    ppu_mem::PALETTE_BASE + u16::from(palette) * 4 + u16::from(color)
}

#[inline]
fn sprite_palette_addr(palette: u8, color: u8) -> u16 {
    ppu_mem::PALETTE_BASE + 0x10 + u16::from(palette) * 4 + u16::from(color)
}

/// Resolves a `$2000-$3EFF` address to an index into physical nametable RAM
/// under the given mirroring.
fn nametable_index(mirroring: Mirroring, addr: u16) -> usize {
    // $3000-$3EFF mirrors $2000-$2EFF.
    let mirrored = if addr >= 0x3000 { addr - 0x1000 } else { addr };
    let relative = mirrored - ppu_mem::NAMETABLE_BASE;
    let table = (relative / ppu_mem::NAMETABLE_SIZE) & 0b11;
    let offset = relative % ppu_mem::NAMETABLE_SIZE;

    let target = match mirroring {
        // $2000/$2800 share a table, $2400/$2C00 the other.
        Mirroring::Vertical => table & 0b01,
        // $2000/$2400 share a table, $2800/$2C00 the other.
        Mirroring::Horizontal => (table >> 1) & 0b01,
        Mirroring::FourScreen => table,
        Mirroring::SingleScreenLower => 0,
        Mirroring::SingleScreenUpper => 1,
    };

    usize::from(target * ppu_mem::NAMETABLE_SIZE + offset)
}
