/*!
scroll.rs - the 15-bit VRAM address / scroll register (`v` and `t`).

Bit layout
==========
```text
yyy NN YYYYY XXXXX
||| || ||||| +++++-- coarse X (tile column 0..31)
||| || +++++-------- coarse Y (tile row 0..29, 30/31 reach attribute bytes)
||| ++-------------- nametable select (bit 10 = X, bit 11 = Y)
+++----------------- fine Y (pixel row inside the tile)
```

Increments used during rendering
================================
- `increment_x`: coarse X 31 -> 0 flips the horizontal nametable bit.
- `increment_y`: fine Y carries into coarse Y. Coarse Y 29 -> 0 flips the
  vertical nametable bit. Coarse Y 31 -> 0 wraps without flipping (rows 30
  and 31 are only reachable through explicit writes).
- `copy_horizontal` / `copy_vertical` transfer the scroll halves of `t`.
*/

const COARSE_X: u16 = 0x001F;
const COARSE_Y: u16 = 0x03E0;
const NAMETABLE_X: u16 = 0x0400;
const NAMETABLE_Y: u16 = 0x0800;
const NAMETABLE: u16 = NAMETABLE_X | NAMETABLE_Y;
const FINE_Y: u16 = 0x7000;
const MASK: u16 = 0x7FFF;

const HORIZONTAL: u16 = COARSE_X | NAMETABLE_X;
const VERTICAL: u16 = COARSE_Y | NAMETABLE_Y | FINE_Y;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VramAddr(u16);

impl VramAddr {
    #[inline]
    pub fn new(raw: u16) -> Self {
        Self(raw & MASK)
    }

    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Address driven on the 14-bit PPU bus.
    #[inline]
    pub fn address(self) -> u16 {
        self.0 & 0x3FFF
    }

    #[inline]
    pub fn coarse_x(self) -> u8 {
        (self.0 & COARSE_X) as u8
    }

    #[inline]
    pub fn coarse_y(self) -> u8 {
        ((self.0 & COARSE_Y) >> 5) as u8
    }

    #[inline]
    pub fn nametable(self) -> u8 {
        ((self.0 & NAMETABLE) >> 10) as u8
    }

    #[inline]
    pub fn fine_y(self) -> u8 {
        ((self.0 & FINE_Y) >> 12) as u8
    }

    #[inline]
    pub fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !COARSE_X) | (value as u16 & 0x1F);
    }

    #[inline]
    pub fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !COARSE_Y) | ((value as u16 & 0x1F) << 5);
    }

    #[inline]
    pub fn set_nametable(&mut self, value: u8) {
        self.0 = (self.0 & !NAMETABLE) | ((value as u16 & 0x03) << 10);
    }

    #[inline]
    pub fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !FINE_Y) | ((value as u16 & 0x07) << 12);
    }

    /// First PPUADDR write: bits 8..13 from `value`, bit 14 cleared.
    #[inline]
    pub fn set_high_byte(&mut self, value: u8) {
        self.0 = (self.0 & 0x00FF) | ((value as u16 & 0x3F) << 8);
    }

    /// Second PPUADDR write.
    #[inline]
    pub fn set_low_byte(&mut self, value: u8) {
        self.0 = (self.0 & 0x7F00) | value as u16;
    }

    /// PPUDATA post-access increment (1 or 32), wrapping within 15 bits.
    #[inline]
    pub fn increment(&mut self, step: u16) {
        self.0 = self.0.wrapping_add(step) & MASK;
    }

    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !COARSE_X;
            self.0 ^= NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    pub fn increment_y(&mut self) {
        let fine = self.fine_y();
        if fine < 7 {
            self.set_fine_y(fine + 1);
            return;
        }
        self.set_fine_y(0);
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= NAMETABLE_Y;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y + 1),
        }
    }

    #[inline]
    pub fn copy_horizontal(&mut self, from: VramAddr) {
        self.0 = (self.0 & !HORIZONTAL) | (from.0 & HORIZONTAL);
    }

    #[inline]
    pub fn copy_vertical(&mut self, from: VramAddr) {
        self.0 = (self.0 & !VERTICAL) | (from.0 & VERTICAL);
    }

    /// Nametable byte for the current tile.
    #[inline]
    pub fn tile_address(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Attribute byte covering the current tile's 4x4 tile block.
    #[inline]
    pub fn attribute_address(self) -> u16 {
        0x23C0 | (self.0 & NAMETABLE) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Shift selecting the 2-bit palette of the current tile inside its attribute byte.
    #[inline]
    pub fn attribute_shift(self) -> u8 {
        ((self.0 >> 4) & 0x04) as u8 | (self.0 & 0x02) as u8
    }
}
