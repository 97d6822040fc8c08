//! CPU and picture bus views.
//!
//! The console ([`crate::Nes`]) owns every device; both buses are
//! short-lived borrowed views constructed per call, so the component graph
//! stays a DAG with no reference counting.

use crate::{
    apu::Apu,
    cartridge::{header::Mirroring, Cartridge},
    controller::ControllerPorts,
    memory::{cpu as cpu_mem, ppu as ppu_mem},
    ppu::Ppu,
    ram::cpu as cpu_ram,
};

/// CPU-visible address space: RAM, PPU registers, APU/IO window, and the
/// cartridge.
pub struct CpuBus<'a> {
    pub(crate) ram: &'a mut cpu_ram::Ram,
    pub(crate) ppu: &'a mut Ppu,
    pub(crate) apu: &'a mut Apu,
    pub(crate) cartridge: Option<&'a mut Cartridge>,
    pub(crate) controllers: &'a mut ControllerPorts,
    /// Pending OAM DMA page latched by a `$4014` write; the CPU consumes it
    /// at its next instruction boundary.
    pub(crate) oam_dma: &'a mut Option<u8>,
    /// CPU cycle counter at bus construction; handed to mappers that care
    /// about write timing.
    pub(crate) cpu_cycle: u64,
}

impl<'a> CpuBus<'a> {
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            cpu_mem::INTERNAL_RAM_START..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[usize::from(addr & cpu_mem::INTERNAL_RAM_MASK)]
            }
            ppu_mem::REGISTER_BASE..=ppu_mem::REGISTER_MIRROR_END => {
                let mut picture = PictureBus::new(self.cartridge.as_deref_mut());
                self.ppu.cpu_read(addr, &mut picture)
            }
            ppu_mem::OAM_DMA => 0,
            cpu_mem::CONTROLLER_PORT_1 => {
                self.controllers.get_mut(0).map(|pad| pad.read()).unwrap_or(0)
            }
            cpu_mem::CONTROLLER_PORT_2 => {
                self.controllers.get_mut(1).map(|pad| pad.read()).unwrap_or(0)
            }
            0x4000..=0x4015 => self.apu.cpu_read(addr),
            // $4018-$401F: CPU test mode, unused on a retail console.
            0x4018..=0x401F => 0,
            cpu_mem::CARTRIDGE_SPACE_START..=cpu_mem::CPU_ADDR_END => self
                .cartridge
                .as_deref()
                .map(|cart| cart.cpu_read(addr))
                .unwrap_or(0),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            cpu_mem::INTERNAL_RAM_START..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[usize::from(addr & cpu_mem::INTERNAL_RAM_MASK)] = value;
            }
            ppu_mem::REGISTER_BASE..=ppu_mem::REGISTER_MIRROR_END => {
                let mut picture = PictureBus::new(self.cartridge.as_deref_mut());
                self.ppu.cpu_write(addr, value, &mut picture);
            }
            ppu_mem::OAM_DMA => *self.oam_dma = Some(value),
            cpu_mem::CONTROLLER_PORT_1 => self.controllers.write_strobe(value),
            // $4017 writes go to the APU frame counter, not the pad.
            0x4000..=0x4015 | cpu_mem::CONTROLLER_PORT_2 => self.apu.cpu_write(addr, value),
            0x4018..=0x401F => {}
            cpu_mem::CARTRIDGE_SPACE_START..=cpu_mem::CPU_ADDR_END => {
                if let Some(cart) = self.cartridge.as_deref_mut() {
                    cart.cpu_write(addr, value, self.cpu_cycle);
                }
            }
        }
    }

    /// Consumes the pending `$4014` DMA request, if any.
    pub fn take_oam_dma(&mut self) -> Option<u8> {
        self.oam_dma.take()
    }

    /// Level of the IRQ line: cartridge mappers OR the APU (stub: never).
    pub fn irq_line(&self) -> bool {
        let cartridge_irq = self
            .cartridge
            .as_deref()
            .map(Cartridge::irq_pending)
            .unwrap_or(false);
        cartridge_irq || self.apu.irq_pending()
    }
}

/// PPU-side view of the cartridge: the pattern-table window plus the
/// mirroring source, borrowed for the duration of one PPU call.
pub struct PictureBus<'a> {
    cartridge: Option<&'a mut Cartridge>,
}

impl<'a> PictureBus<'a> {
    pub fn new(cartridge: Option<&'a mut Cartridge>) -> Self {
        Self { cartridge }
    }

    /// View with no cartridge attached (reads float to zero).
    pub fn none() -> Self {
        Self { cartridge: None }
    }

    /// Pattern table read (`$0000-$1FFF`).
    pub fn read_chr(&mut self, addr: u16) -> u8 {
        self.cartridge
            .as_deref()
            .map(|cart| cart.ppu_read(addr))
            .unwrap_or(0)
    }

    /// Pattern table write (stores on CHR-RAM boards).
    pub fn write_chr(&mut self, addr: u16, value: u8) {
        if let Some(cart) = self.cartridge.as_deref_mut() {
            cart.ppu_write(addr, value);
        }
    }

    /// Nametable mirroring currently selected by the board.
    pub fn mirroring(&self) -> Mirroring {
        self.cartridge
            .as_deref()
            .map(Cartridge::mirroring)
            .unwrap_or(Mirroring::Horizontal)
    }

    /// Forwards the dot-260 scanline clock to the board.
    pub fn tick_scanline(&mut self) {
        if let Some(cart) = self.cartridge.as_deref_mut() {
            cart.tick_scanline();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> (cpu_ram::Ram, Ppu, Apu, ControllerPorts, Option<u8>) {
        (
            cpu_ram::Ram::new(),
            Ppu::new(),
            Apu::new(),
            ControllerPorts::new(),
            None,
        )
    }

    macro_rules! bus {
        ($ram:ident, $ppu:ident, $apu:ident, $pads:ident, $dma:ident) => {
            CpuBus {
                ram: &mut $ram,
                ppu: &mut $ppu,
                apu: &mut $apu,
                cartridge: None,
                controllers: &mut $pads,
                oam_dma: &mut $dma,
                cpu_cycle: 0,
            }
        };
    }

    #[test]
    fn internal_ram_mirrors_every_2k() {
        let (mut ram, mut ppu, mut apu, mut pads, mut dma) = devices();
        let mut bus = bus!(ram, ppu, apu, pads, dma);

        bus.write(0x0002, 0xDE);
        assert_eq!(bus.read(0x0002), 0xDE);
        assert_eq!(bus.read(0x0802), 0xDE);
        assert_eq!(bus.read(0x1002), 0xDE);
        assert_eq!(bus.read(0x1802), 0xDE);
    }

    #[test]
    fn oam_dma_write_latches_the_page() {
        let (mut ram, mut ppu, mut apu, mut pads, mut dma) = devices();
        let mut bus = bus!(ram, ppu, apu, pads, dma);

        bus.write(0x4014, 0x02);
        assert_eq!(bus.take_oam_dma(), Some(0x02));
        assert_eq!(bus.take_oam_dma(), None);
    }

    #[test]
    fn unmapped_reads_return_zero() {
        let (mut ram, mut ppu, mut apu, mut pads, mut dma) = devices();
        let mut bus = bus!(ram, ppu, apu, pads, dma);

        assert_eq!(bus.read(0x401C), 0);
        assert_eq!(bus.read(0x5000), 0);
        assert_eq!(bus.read(0x8000), 0);
    }

    #[test]
    fn ppu_register_mirrors_decode_every_8_bytes() {
        let (mut ram, mut ppu, mut apu, mut pads, mut dma) = devices();
        let mut bus = bus!(ram, ppu, apu, pads, dma);

        // $2006/$2007 mirrored at $3FFE/$3FFF.
        bus.write(0x3FFE, 0x3F);
        bus.write(0x3FFE, 0x00);
        bus.write(0x3FFF, 0x2A);
        bus.write(0x2006, 0x3F);
        bus.write(0x2006, 0x00);
        assert_eq!(bus.read(0x2007), 0x2A);
    }
}
