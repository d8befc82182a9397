#![doc = r#"
PPU registers module

Purpose
- Typed views of PPUCTRL / PPUMASK / PPUSTATUS.
- CPU-visible register semantics for the eight-byte window ($2000-$2007):
  buffering, the shared write toggle, scroll latches and read-back rules.

Notes
- The bus hook (`bus::ppu_registers`) hands over the register index 0..=7;
  address mirroring is the hook's stride, not this module's concern.
- Every write drives the register latch. Reads of readable registers refresh
  it, and reads of write-only registers return it unchanged.
- PPUSTATUS returns its three flags over the low five latch bits, then clears
  vblank and the write toggle.
- PPUDATA reads below $3F00 return the internal buffer and refill it. Palette
  reads return the palette byte directly and refill the buffer with the
  nametable byte underneath ($3Fxx - $1000).
- Setting NMI_ENABLE while vblank is already set raises NMI immediately.
"#]

use bitflags::bitflags;

use super::Ppu;
use crate::error::EmuError;

bitflags! {
    /// $2000
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PpuCtrl: u8 {
        const NAMETABLE_X = 1;
        const NAMETABLE_Y = 1 << 1;
        const INCREMENT_32 = 1 << 2;
        const SPRITE_TABLE = 1 << 3;
        const BACKGROUND_TABLE = 1 << 4;
        const SPRITE_16 = 1 << 5;
        const MASTER_SLAVE = 1 << 6;
        const NMI_ENABLE = 1 << 7;
    }
}

impl PpuCtrl {
    #[inline]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::INCREMENT_32) { 32 } else { 1 }
    }

    #[inline]
    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_16) { 16 } else { 8 }
    }

    #[inline]
    pub fn background_table(self) -> u16 {
        if self.contains(Self::BACKGROUND_TABLE) { 0x1000 } else { 0 }
    }

    /// Pattern table for 8x8 sprites (8x16 sprites pick it from the tile index).
    #[inline]
    pub fn sprite_table(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0 }
    }
}

bitflags! {
    /// $2001
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PpuMask: u8 {
        const GREYSCALE = 1;
        const SHOW_BACKGROUND_LEFT = 1 << 1;
        const SHOW_SPRITES_LEFT = 1 << 2;
        const SHOW_BACKGROUND = 1 << 3;
        const SHOW_SPRITES = 1 << 4;
        const EMPHASIZE_RED = 1 << 5;
        const EMPHASIZE_GREEN = 1 << 6;
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

impl PpuMask {
    #[inline]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BACKGROUND | Self::SHOW_SPRITES)
    }

    /// Background pixel visible at column `x`.
    #[inline]
    pub fn background_visible(self, x: u8) -> bool {
        self.contains(Self::SHOW_BACKGROUND)
            && (x >= 8 || self.contains(Self::SHOW_BACKGROUND_LEFT))
    }

    /// Sprite pixel visible at column `x`.
    #[inline]
    pub fn sprites_visible(self, x: u8) -> bool {
        self.contains(Self::SHOW_SPRITES) && (x >= 8 || self.contains(Self::SHOW_SPRITES_LEFT))
    }
}

bitflags! {
    /// $2002 (upper three bits; the rest is open bus)
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PpuStatus: u8 {
        const SPRITE_OVERFLOW = 1 << 5;
        const SPRITE_ZERO_HIT = 1 << 6;
        const VBLANK = 1 << 7;
    }
}

pub const PPUCTRL: u16 = 0;
pub const PPUMASK: u16 = 1;
pub const PPUSTATUS: u16 = 2;
pub const OAMADDR: u16 = 3;
pub const OAMDATA: u16 = 4;
pub const PPUSCROLL: u16 = 5;
pub const PPUADDR: u16 = 6;
pub const PPUDATA: u16 = 7;

/// First palette address; PPUDATA reads from here on are not buffered.
const PALETTE_BASE: u16 = 0x3F00;

impl Ppu {
    /// CPU read of register `reg` (0..=7) with side effects.
    pub fn read_register(&mut self, reg: u16) -> Result<u8, EmuError> {
        let value = match reg & 7 {
            PPUSTATUS => {
                let v = self.status.bits() | (self.io_latch & 0x1F);
                self.status.remove(PpuStatus::VBLANK);
                self.w = false;
                v
            }
            OAMDATA => self.read_oam_data(),
            PPUDATA => {
                let addr = self.v.address();
                let v = if addr < PALETTE_BASE {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.bus.read(addr)?;
                    buffered
                } else {
                    self.read_buffer = self.bus.read(addr - 0x1000)?;
                    self.bus.read(addr)?
                };
                self.v.increment(self.ctrl.vram_increment());
                v
            }
            // write-only
            _ => return Ok(self.io_latch),
        };
        self.io_latch = value;
        Ok(value)
    }

    /// CPU write of `value` to register `reg` (0..=7).
    pub fn write_register(&mut self, reg: u16, value: u8) -> Result<(), EmuError> {
        self.io_latch = value;
        match reg & 7 {
            PPUCTRL => {
                let was_enabled = self.ctrl.contains(PpuCtrl::NMI_ENABLE);
                self.ctrl = PpuCtrl::from_bits_retain(value);
                self.t.set_nametable(value & 0x03);
                if !was_enabled
                    && self.ctrl.contains(PpuCtrl::NMI_ENABLE)
                    && self.status.contains(PpuStatus::VBLANK)
                {
                    self.nmi_pending = true;
                }
            }
            PPUMASK => self.mask = PpuMask::from_bits_retain(value),
            OAMADDR => self.oam_addr = value,
            OAMDATA => self.write_oam_data(value),
            PPUSCROLL => {
                if !self.w {
                    self.t.set_coarse_x(value >> 3);
                    self.fine_x = value & 0x07;
                } else {
                    self.t.set_fine_y(value & 0x07);
                    self.t.set_coarse_y(value >> 3);
                }
                self.w = !self.w;
            }
            PPUADDR => {
                if !self.w {
                    self.t.set_high_byte(value & 0x3F);
                } else {
                    self.t.set_low_byte(value);
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            PPUDATA => {
                self.bus.write(self.v.address(), value)?;
                self.v.increment(self.ctrl.vram_increment());
            }
            // PPUSTATUS is read-only.
            _ => {}
        }
        Ok(())
    }

    /// Register value as a read would return it, without side effects.
    pub fn peek_register(&self, reg: u16) -> u8 {
        match reg & 7 {
            PPUSTATUS => self.status.bits() | (self.io_latch & 0x1F),
            OAMDATA => self.peek_oam_data(),
            PPUDATA => {
                let addr = self.v.address();
                if addr < PALETTE_BASE {
                    self.read_buffer
                } else {
                    self.bus.peek(addr).unwrap_or(self.io_latch)
                }
            }
            _ => self.io_latch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_ppu;

    #[test]
    fn status_read_clears_vblank_and_write_toggle() {
        let mut p = test_ppu();
        p.status.insert(PpuStatus::VBLANK | PpuStatus::SPRITE_ZERO_HIT);
        p.write_register(PPUSCROLL, 0x00).unwrap();
        assert!(p.w);

        let s = p.read_register(PPUSTATUS).unwrap();
        assert_eq!(s & 0xE0, 0xC0);
        assert!(!p.status.contains(PpuStatus::VBLANK));
        assert!(p.status.contains(PpuStatus::SPRITE_ZERO_HIT));
        assert!(!p.w);
    }

    #[test]
    fn status_low_bits_come_from_register_latch() {
        let mut p = test_ppu();
        p.write_register(PPUMASK, 0x1F).unwrap();
        assert_eq!(p.read_register(PPUSTATUS).unwrap(), 0x1F);
        // Write-only registers read back the latch.
        p.write_register(OAMADDR, 0xA5).unwrap();
        assert_eq!(p.read_register(PPUCTRL).unwrap(), 0xA5);
        assert_eq!(p.read_register(PPUSCROLL).unwrap(), 0xA5);
    }

    #[test]
    fn ppudata_buffered_read_and_increment() {
        let mut p = test_ppu();
        p.bus.write(0x2000, 0x11).unwrap();
        p.bus.write(0x2001, 0x22).unwrap();
        p.write_register(PPUADDR, 0x20).unwrap();
        p.write_register(PPUADDR, 0x00).unwrap();

        // First read returns the stale buffer.
        assert_eq!(p.read_register(PPUDATA).unwrap(), 0x00);
        assert_eq!(p.read_register(PPUDATA).unwrap(), 0x11);
        assert_eq!(p.read_register(PPUDATA).unwrap(), 0x22);
        assert_eq!(p.v.address(), 0x2003);
    }

    #[test]
    fn palette_read_is_direct_and_refills_buffer_from_nametable() {
        let mut p = test_ppu();
        p.bus.write(0x3F01, 0x2A).unwrap();
        p.bus.write(0x2F01, 0x77).unwrap();
        p.write_register(PPUADDR, 0x3F).unwrap();
        p.write_register(PPUADDR, 0x01).unwrap();
        assert_eq!(p.read_register(PPUDATA).unwrap(), 0x2A);
        assert_eq!(p.read_buffer, 0x77);
    }

    #[test]
    fn ppudata_write_increments_by_32_when_selected() {
        let mut p = test_ppu();
        p.write_register(PPUCTRL, PpuCtrl::INCREMENT_32.bits()).unwrap();
        p.write_register(PPUADDR, 0x20).unwrap();
        p.write_register(PPUADDR, 0x00).unwrap();
        p.write_register(PPUDATA, 0xAB).unwrap();
        p.write_register(PPUDATA, 0xCD).unwrap();
        assert_eq!(p.bus.peek(0x2000).unwrap(), 0xAB);
        assert_eq!(p.bus.peek(0x2020).unwrap(), 0xCD);
        assert_eq!(p.v.address(), 0x2040);
    }

    #[test]
    fn scroll_writes_fill_t_and_fine_x() {
        let mut p = test_ppu();
        p.write_register(PPUCTRL, 0x03).unwrap();
        // X = 0x7D -> coarse 15, fine 5; Y = 0x5E -> coarse 11, fine 6
        p.write_register(PPUSCROLL, 0x7D).unwrap();
        p.write_register(PPUSCROLL, 0x5E).unwrap();
        assert_eq!(p.t.coarse_x(), 15);
        assert_eq!(p.fine_x, 5);
        assert_eq!(p.t.coarse_y(), 11);
        assert_eq!(p.t.fine_y(), 6);
        assert_eq!(p.t.nametable(), 3);
        assert!(!p.w);
        // v untouched until the second PPUADDR write.
        assert_eq!(p.v.raw(), 0);
    }

    #[test]
    fn address_writes_copy_t_to_v_on_second_write() {
        let mut p = test_ppu();
        p.write_register(PPUADDR, 0xFF).unwrap();
        assert_eq!(p.v.raw(), 0);
        p.write_register(PPUADDR, 0x34).unwrap();
        // Top two bits of the high byte are dropped.
        assert_eq!(p.v.raw(), 0x3F34);
    }

    #[test]
    fn oamdata_write_increments_address_read_does_not() {
        let mut p = test_ppu();
        p.write_register(OAMADDR, 0x10).unwrap();
        p.write_register(OAMDATA, 0x42).unwrap();
        p.write_register(OAMDATA, 0x43).unwrap();
        assert_eq!(p.oam()[0x10], 0x42);
        assert_eq!(p.oam()[0x11], 0x43);
        p.write_register(OAMADDR, 0x11).unwrap();
        assert_eq!(p.read_register(OAMDATA).unwrap(), 0x43);
        assert_eq!(p.read_register(OAMDATA).unwrap(), 0x43);
    }

    #[test]
    fn enabling_nmi_during_vblank_raises_it() {
        let mut p = test_ppu();
        p.status.insert(PpuStatus::VBLANK);
        p.write_register(PPUCTRL, 0x80).unwrap();
        assert!(p.take_nmi());
        // Already enabled: rewriting does not raise again.
        p.write_register(PPUCTRL, 0x80).unwrap();
        assert!(!p.take_nmi());
    }

    #[test]
    fn peek_matches_read_without_clearing() {
        let mut p = test_ppu();
        p.status.insert(PpuStatus::VBLANK);
        assert_eq!(p.peek_register(PPUSTATUS) & 0x80, 0x80);
        assert!(p.status.contains(PpuStatus::VBLANK));
    }
}
