#![doc = r#"
PPU OAM evaluation submodule

Responsibilities
- Per-dot sprite evaluation for the line after the current one:
  * CLEAR     dots 1..=64    secondary OAM filled with $FF, one byte per two dots
  * EVALUATE  dots 65..=256  one primary entry every three dots, all 64 entries
  * FETCH     dots 257..=320 eight dots per slot, pattern bytes read at the slot's last dot
- Sprite overflow on the ninth in-range entry.

Behavioral notes
- An entry is in range when `0 <= scanline - Y < height`. OAM Y is the line
  before the sprite's first visible line, so sprites found on line N are drawn
  on line N + 1 with row `N - Y`.
- Evaluation runs on visible lines only; the pre-render line just clears, so
  line 0 never shows sprites.
- Overflow is the straightforward "more than eight" rule. The hardware's
  diagonal OAM scan after the eighth hit is not reproduced.
- Horizontal flip is applied at fetch time by bit-reversing both planes.
"#]

use super::Ppu;
use super::sprite::reverse8;
use crate::error::EmuError;
use crate::ppu::registers::PpuStatus;

pub(in crate::ppu) const MAX_SPRITES_PER_LINE: usize = 8;
const SECONDARY_OAM_SIZE: usize = MAX_SPRITES_PER_LINE * 4;

pub(in crate::ppu) const ATTR_PALETTE: u8 = 0x03;
pub(in crate::ppu) const ATTR_BEHIND_BACKGROUND: u8 = 0x20;
pub(in crate::ppu) const ATTR_FLIP_H: u8 = 0x40;
pub(in crate::ppu) const ATTR_FLIP_V: u8 = 0x80;

/// Pattern planes and placement of one sprite on the current line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::ppu) struct SpriteSlot {
    pub(in crate::ppu) pattern_lo: u8,
    pub(in crate::ppu) pattern_hi: u8,
    pub(in crate::ppu) attribute: u8,
    pub(in crate::ppu) x: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::ppu) struct Sprites {
    secondary: [u8; SECONDARY_OAM_SIZE],
    found: u8,
    zero_found: bool,
    pub(in crate::ppu) slots: [SpriteSlot; MAX_SPRITES_PER_LINE],
    pub(in crate::ppu) count: u8,
    pub(in crate::ppu) zero_in_line: bool,
}

impl Default for Sprites {
    fn default() -> Self {
        Self {
            secondary: [0xFF; SECONDARY_OAM_SIZE],
            found: 0,
            zero_found: false,
            slots: [SpriteSlot::default(); MAX_SPRITES_PER_LINE],
            count: 0,
            zero_in_line: false,
        }
    }
}

impl Ppu {
    /// Sprite-side work for the current dot of a render line.
    pub(in crate::ppu) fn sprite_evaluation(&mut self, visible: bool) -> Result<(), EmuError> {
        let dot = self.dot;
        match dot {
            1..=64 => {
                if dot == 1 {
                    self.sprites.found = 0;
                    self.sprites.zero_found = false;
                }
                if dot & 1 == 1 {
                    self.sprites.secondary[((dot - 1) / 2) as usize] = 0xFF;
                }
            }
            65..=256 if visible => {
                let step = dot - 65;
                if step % 3 == 0 && step / 3 < 64 {
                    self.evaluate_entry((step / 3) as usize);
                }
            }
            257..=320 => {
                if dot == 257 {
                    self.sprites.count = self.sprites.found;
                    self.sprites.zero_in_line = self.sprites.zero_found;
                }
                let step = dot - 257;
                if step % 8 == 7 {
                    self.fetch_slot((step / 8) as usize)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn evaluate_entry(&mut self, n: usize) {
        let base = n * 4;
        let row = self.scanline as i32 - self.oam[base] as i32;
        if row < 0 || row >= self.ctrl.sprite_height() as i32 {
            return;
        }
        let found = self.sprites.found as usize;
        if found < MAX_SPRITES_PER_LINE {
            self.sprites.secondary[found * 4..found * 4 + 4]
                .copy_from_slice(&self.oam[base..base + 4]);
            if n == 0 {
                self.sprites.zero_found = true;
            }
            self.sprites.found += 1;
        } else {
            self.status.insert(PpuStatus::SPRITE_OVERFLOW);
        }
    }

    fn fetch_slot(&mut self, slot: usize) -> Result<(), EmuError> {
        if slot >= self.sprites.count as usize {
            self.sprites.slots[slot] = SpriteSlot::default();
            return Ok(());
        }
        let entry = &self.sprites.secondary[slot * 4..slot * 4 + 4];
        let (y, tile, attribute, x) = (entry[0], entry[1], entry[2], entry[3]);

        let height = self.ctrl.sprite_height();
        let mut row = (self.scanline as i32 - y as i32).clamp(0, height as i32 - 1) as u16;
        if attribute & ATTR_FLIP_V != 0 {
            row = height - 1 - row;
        }
        let addr = if height == 16 {
            let table = (tile as u16 & 1) * 0x1000;
            let top = (tile & 0xFE) as u16;
            let tile = if row < 8 { top } else { top + 1 };
            table + tile * 16 + (row & 7)
        } else {
            self.ctrl.sprite_table() + tile as u16 * 16 + row
        };

        let mut lo = self.bus.read(addr)?;
        let mut hi = self.bus.read(addr + 8)?;
        if attribute & ATTR_FLIP_H != 0 {
            lo = reverse8(lo);
            hi = reverse8(hi);
        }
        self.sprites.slots[slot] = SpriteSlot {
            pattern_lo: lo,
            pattern_hi: hi,
            attribute,
            x,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::NullSink;
    use crate::ppu::registers::{PpuCtrl, PpuMask};
    use crate::test_utils::test_ppu;

    fn run_to(p: &mut Ppu, scanline: u16, dot: u16) {
        let mut sink = NullSink;
        while !(p.scanline == scanline && p.dot == dot) {
            p.tick(&mut sink).unwrap();
        }
    }

    fn place(p: &mut Ppu, index: usize, y: u8, tile: u8, attr: u8, x: u8) {
        p.oam[index * 4..index * 4 + 4].copy_from_slice(&[y, tile, attr, x]);
    }

    #[test]
    fn evaluation_copies_up_to_eight_and_flags_the_ninth() {
        let mut p = test_ppu();
        p.mask = PpuMask::SHOW_SPRITES;
        p.oam.fill(0xF0);
        for i in 0..9 {
            place(&mut p, i * 3 + 1, 20, i as u8, 0, i as u8 * 10);
        }
        run_to(&mut p, 20, 257);
        assert_eq!(p.sprites.found, 8);
        assert!(p.status.contains(PpuStatus::SPRITE_OVERFLOW));
        assert!(!p.sprites.zero_found);
        assert_eq!(&p.sprites.secondary[0..4], &[20, 0, 0, 0]);
        assert_eq!(&p.sprites.secondary[28..32], &[20, 7, 0, 70]);
    }

    #[test]
    fn eight_sprites_do_not_overflow() {
        let mut p = test_ppu();
        p.mask = PpuMask::SHOW_SPRITES;
        p.oam.fill(0xF0);
        for i in 0..8 {
            place(&mut p, i, 50, 0, 0, 0);
        }
        run_to(&mut p, 50, 321);
        assert_eq!(p.sprites.count, 8);
        assert!(p.sprites.zero_in_line);
        assert!(!p.status.contains(PpuStatus::SPRITE_OVERFLOW));
    }

    #[test]
    fn range_check_uses_sprite_height() {
        let mut p = test_ppu();
        p.mask = PpuMask::SHOW_SPRITES;
        p.oam.fill(0xF0);
        place(&mut p, 0, 10, 0, 0, 0);
        run_to(&mut p, 19, 257);
        assert_eq!(p.sprites.found, 0);

        p.ctrl = PpuCtrl::SPRITE_16;
        run_to(&mut p, 25, 257);
        assert_eq!(p.sprites.found, 1);
        run_to(&mut p, 26, 257);
        assert_eq!(p.sprites.found, 0);
    }

    #[test]
    fn fetch_applies_flips_and_8x16_tile_selection() {
        let mut p = test_ppu();
        p.mask = PpuMask::SHOW_SPRITES;
        p.ctrl = PpuCtrl::SPRITE_16;
        p.oam.fill(0xF0);
        // Tile pair 4/5 in the $1000 table; vertically flipped, row 0 reads tile 5 row 7.
        place(&mut p, 0, 30, 0x05, ATTR_FLIP_V | ATTR_FLIP_H, 40);
        p.poke_vram(0x1000 + 5 * 16 + 7, 0b0000_0001).unwrap();
        p.poke_vram(0x1000 + 5 * 16 + 15, 0b1000_0000).unwrap();
        run_to(&mut p, 30, 321);
        let slot = p.sprites.slots[0];
        assert_eq!(slot.pattern_lo, 0b1000_0000);
        assert_eq!(slot.pattern_hi, 0b0000_0001);
        assert_eq!(slot.x, 40);
        assert_eq!(p.sprites.slots[1], SpriteSlot::default());
    }

    #[test]
    fn pre_render_line_selects_nothing() {
        let mut p = test_ppu();
        p.mask = PpuMask::SHOW_SPRITES;
        p.oam.fill(0);
        let pre = p.region.pre_render_line();
        run_to(&mut p, pre, 321);
        assert_eq!(p.sprites.count, 0);
    }
}
