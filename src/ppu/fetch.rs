#![doc = r#"
PPU background fetch pipeline

Responsibilities
- The 8-dot fetch sequence (nametable, attribute, pattern low, pattern high)
  driven by `v`, two tiles ahead of the pixel being drawn.
- 16-bit pattern and attribute shift registers; fine X selects the output bit.

Cycle plan (render lines, rendering enabled)
- Dots 1-256 and 321-336: fetch step `(dot - 1) % 8`:
  0 reload shifters + nametable byte, 2 attribute, 4 pattern low,
  6 pattern high, 7 coarse X increment.
- Dots 2-257 and 322-337: shift.
- Dot 256: Y increment. Dot 257: reload + horizontal copy from `t`.
- Dots 338 and 340: unused nametable fetches.
"#]

use super::Ppu;
use crate::error::EmuError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::ppu) struct Background {
    tile: u8,
    attribute: u8,
    pattern_lo: u8,
    pattern_hi: u8,
    shift_lo: u16,
    shift_hi: u16,
    attr_lo: u16,
    attr_hi: u16,
}

impl Background {
    /// Move the latched tile into the low byte of the shifters.
    #[inline]
    fn reload(&mut self) {
        self.shift_lo = (self.shift_lo & 0xFF00) | self.pattern_lo as u16;
        self.shift_hi = (self.shift_hi & 0xFF00) | self.pattern_hi as u16;
        let fill = |bit: u8| if self.attribute & bit != 0 { 0x00FF } else { 0x0000 };
        self.attr_lo = (self.attr_lo & 0xFF00) | fill(0x01);
        self.attr_hi = (self.attr_hi & 0xFF00) | fill(0x02);
    }

    #[inline]
    pub(in crate::ppu) fn shift(&mut self) {
        self.shift_lo <<= 1;
        self.shift_hi <<= 1;
        self.attr_lo <<= 1;
        self.attr_hi <<= 1;
    }

    /// `(pattern 0..=3, palette 0..=3)` under the cursor.
    #[inline]
    pub(in crate::ppu) fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let mux = 0x8000u16 >> fine_x;
        let bit = |r: u16| (r & mux != 0) as u8;
        (
            bit(self.shift_hi) << 1 | bit(self.shift_lo),
            bit(self.attr_hi) << 1 | bit(self.attr_lo),
        )
    }
}

impl Ppu {
    /// One step of the background fetch sequence for the current dot.
    pub(in crate::ppu) fn background_fetch(&mut self) -> Result<(), EmuError> {
        let dot = self.dot;
        if (1..=256).contains(&dot) || (321..=336).contains(&dot) {
            match (dot - 1) % 8 {
                0 => {
                    self.background.reload();
                    self.background.tile = self.bus.read(self.v.tile_address())?;
                }
                2 => {
                    let byte = self.bus.read(self.v.attribute_address())?;
                    self.background.attribute = (byte >> self.v.attribute_shift()) & 0x03;
                }
                4 => {
                    let addr = self.pattern_row_address();
                    self.background.pattern_lo = self.bus.read(addr)?;
                }
                6 => {
                    let addr = self.pattern_row_address();
                    self.background.pattern_hi = self.bus.read(addr + 8)?;
                }
                7 => self.v.increment_x(),
                _ => {}
            }
        }
        match dot {
            256 => self.v.increment_y(),
            257 => {
                self.background.reload();
                self.v.copy_horizontal(self.t);
            }
            338 | 340 => {
                self.bus.read(self.v.tile_address())?;
            }
            _ => {}
        }
        Ok(())
    }

    #[inline]
    fn pattern_row_address(&self) -> u16 {
        self.ctrl.background_table() + self.background.tile as u16 * 16 + self.v.fine_y() as u16
    }
}
