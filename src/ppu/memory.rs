#![doc = r#"
PPU memory submodule

Responsibilities
- OAMDATA semantics shared by the register window and OAM DMA.
- Side-effect free VRAM/OAM accessors for debuggers and tests.

Notes
- OAMDATA writes store at OAMADDR and post-increment it (wrapping at 256).
  Reads never increment.
- Attribute bytes (every fourth byte, offset 2) have no storage for bits 2-4;
  they read back as zero.
- OAM DMA delivers through `OamWriter`, which is exactly an OAMDATA write.
"#]

use super::Ppu;
use crate::bus::dma::OamWriter;
use crate::error::EmuError;

pub const OAM_SIZE: usize = 256;

impl Ppu {
    #[inline]
    pub(in crate::ppu) fn write_oam_data(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    #[inline]
    pub(in crate::ppu) fn read_oam_data(&self) -> u8 {
        self.peek_oam_data()
    }

    #[inline]
    pub(in crate::ppu) fn peek_oam_data(&self) -> u8 {
        let value = self.oam[self.oam_addr as usize];
        if self.oam_addr & 3 == 2 { value & 0xE3 } else { value }
    }

    /// Primary OAM contents.
    #[inline]
    pub fn oam(&self) -> &[u8; OAM_SIZE] {
        &self.oam
    }

    /// Read a PPU-bus byte without touching the PPUDATA buffer.
    pub fn peek_vram(&self, addr: u16) -> Result<u8, EmuError> {
        self.bus.peek(addr)
    }

    /// Store a PPU-bus byte without moving `v` (loaders and tests).
    pub fn poke_vram(&mut self, addr: u16, value: u8) -> Result<(), EmuError> {
        self.bus.write(addr, value)
    }
}

impl OamWriter for Ppu {
    #[inline]
    fn write_oam_data(&mut self, value: u8) {
        Ppu::write_oam_data(self, value);
    }
}
