//! famicore: a cycle-coordinated NES (2A03 + 2C02) emulation core.
//!
//! The console advances one CPU instruction at a time; every CPU cycle is
//! followed by exactly three PPU dots, which is the phase alignment NTSC
//! software depends on. Presentation and input decoding stay outside: the
//! core hands a 256x240 buffer of master-palette indices to a
//! [`FrameSink`] (or exposes it through [`Nes::framebuffer`]) and takes
//! controller state through [`Nes::set_button`].

use std::path::Path;

use tracing::{debug, info};

use crate::{
    apu::Apu,
    bus::{CpuBus, PictureBus},
    cartridge::Cartridge,
    controller::{Button, ControllerPorts},
    cpu::{Cpu, CpuSnapshot},
    error::Error,
    ppu::Ppu,
    ram::cpu as cpu_ram,
    reset_kind::ResetKind,
};

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod ppu;
pub mod ram;
pub mod reset_kind;

/// PPU dots per CPU cycle (NTSC).
pub const PPU_DOTS_PER_CPU_CYCLE: u64 = 3;
/// NTSC CPU clock rate in Hz.
pub const CPU_CLOCK_HZ: u32 = 1_789_773;

/// Consumer of finished frames.
///
/// `frame` receives the 256x240 master-palette index buffer; it stays valid
/// until the next PPU tick, so sinks that keep it must copy.
pub trait FrameSink {
    fn frame(&mut self, indices: &[u8]);
}

/// The console: owns the CPU, PPU, APU stub, RAM, controller ports, and the
/// inserted cartridge. Buses are borrowed views built per call.
#[derive(Debug)]
pub struct Nes {
    cpu: Cpu,
    ppu: Ppu,
    apu: Apu,
    ram: cpu_ram::Ram,
    cartridge: Option<Cartridge>,
    controllers: ControllerPorts,
    /// `$4014` page latched by the bus until the CPU picks it up.
    pending_oam_dma: Option<u8>,
}

/// Builder for a powered-on console; mostly a readability helper that makes
/// the defaults explicit.
#[derive(Debug, Default)]
pub struct NesBuilder {
    cartridge: Option<Cartridge>,
}

impl NesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a cartridge before power-on.
    pub fn cartridge(mut self, cartridge: Cartridge) -> Self {
        self.cartridge = Some(cartridge);
        self
    }

    pub fn build(self) -> Nes {
        let mut nes = Nes {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            ram: cpu_ram::Ram::new(),
            cartridge: self.cartridge,
            controllers: ControllerPorts::new(),
            pending_oam_dma: None,
        };
        nes.reset(ResetKind::PowerOn);
        nes
    }
}

/// Builds a [`CpuBus`] view over the console's devices.
macro_rules! cpu_bus {
    ($nes:expr) => {
        CpuBus {
            ram: &mut $nes.ram,
            ppu: &mut $nes.ppu,
            apu: &mut $nes.apu,
            cartridge: $nes.cartridge.as_mut(),
            controllers: &mut $nes.controllers,
            oam_dma: &mut $nes.pending_oam_dma,
            cpu_cycle: $nes.cpu.cycles(),
        }
    };
}

impl Nes {
    /// A powered-on console with no cartridge inserted.
    pub fn new() -> Self {
        NesBuilder::new().build()
    }

    pub fn builder() -> NesBuilder {
        NesBuilder::new()
    }

    /// Parses an iNES image and inserts it, power-cycling the console.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let cartridge = Cartridge::new(bytes)?;
        self.insert_cartridge(cartridge);
        Ok(())
    }

    /// Loads a cartridge from disk, inserts it, and power-cycles.
    pub fn load_rom_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let cartridge = Cartridge::from_file(path)?;
        self.insert_cartridge(cartridge);
        Ok(())
    }

    /// Inserting a cartridge is a power cycle for the console.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
        self.reset(ResetKind::PowerOn);
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    /// Applies a power-on or warm reset across every device, then runs the
    /// CPU reset sequence through the freshly wired bus.
    pub fn reset(&mut self, kind: ResetKind) {
        if matches!(kind, ResetKind::PowerOn) {
            self.ram = cpu_ram::Ram::new();
        }
        self.ppu.reset();
        self.apu.reset();
        if let Some(cart) = self.cartridge.as_mut() {
            cart.reset(kind);
        }
        self.pending_oam_dma = None;

        let mut bus = cpu_bus!(self);
        self.cpu.reset(&mut bus, kind);
        info!(?kind, "console reset");
    }

    /// Executes one CPU instruction (or one interrupt/DMA service) and
    /// advances the PPU three dots per consumed cycle.
    pub fn step(&mut self) -> Result<u64, Error> {
        let cycles = {
            let mut bus = cpu_bus!(self);
            self.cpu.step(&mut bus)?
        };

        let mut picture = PictureBus::new(self.cartridge.as_mut());
        for _ in 0..cycles * PPU_DOTS_PER_CPU_CYCLE {
            self.ppu.clock(&mut picture);
            if self.ppu.take_nmi() {
                self.cpu.assert_nmi();
            }
        }

        Ok(cycles)
    }

    /// Runs until the PPU completes the current frame.
    pub fn run_frame(&mut self) -> Result<(), Error> {
        loop {
            self.step()?;
            if self.ppu.take_frame_ready() {
                debug!(frame = self.ppu.frame_count(), "frame complete");
                return Ok(());
            }
        }
    }

    /// Runs one frame and hands the finished buffer to `sink`.
    pub fn run_frame_into(&mut self, sink: &mut dyn FrameSink) -> Result<(), Error> {
        self.run_frame()?;
        sink.frame(self.ppu.framebuffer());
        Ok(())
    }

    /// The current picture as master-palette indices, stable between
    /// frame-ready and the next tick.
    pub fn framebuffer(&self) -> &[u8] {
        self.ppu.framebuffer()
    }

    /// Updates the pressed state of a controller button (port 0 or 1).
    pub fn set_button(&mut self, port: usize, button: Button, pressed: bool) {
        if let Some(pad) = self.controllers.get_mut(port) {
            pad.set_button(button, pressed);
        }
    }

    /// Replaces a controller's whole snapshot byte.
    pub fn set_controller_state(&mut self, port: usize, state: u8) {
        if let Some(pad) = self.controllers.get_mut(port) {
            pad.set_state(state);
        }
    }

    /// CPU register snapshot for tracing/debugging.
    pub fn cpu_snapshot(&self) -> CpuSnapshot {
        self.cpu.snapshot()
    }

    /// Total CPU cycles since power-on.
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    /// Reads a byte from the CPU address space (debug/test helper; carries
    /// the usual read side effects).
    pub fn peek_cpu_byte(&mut self, addr: u16) -> u8 {
        let mut bus = cpu_bus!(self);
        bus.read(addr)
    }

    /// Writes a byte into the CPU address space (debug/test helper).
    pub fn poke_cpu_byte(&mut self, addr: u16, value: u8) {
        let mut bus = cpu_bus!(self);
        bus.write(addr, value);
    }
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use ctor::ctor;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    use super::*;

    #[ctor]
    fn init_tracing() {
        let subscriber = FmtSubscriber::builder()
            .with_test_writer()
            .with_max_level(Level::DEBUG)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn powers_on_without_a_cartridge() {
        let nes = Nes::new();
        assert_eq!(nes.framebuffer().len(), 256 * 240);
        assert!(nes.cartridge().is_none());
    }

    #[test]
    fn stepping_without_a_cartridge_is_harmless() {
        // The reset vector reads 0 from the open bus, so PC starts at 0
        // inside RAM full of BRK; every step just services BRK through the
        // zeroed IRQ vector.
        let mut nes = Nes::new();
        for _ in 0..10 {
            nes.step().expect("BRK is a documented opcode");
        }
    }
}
