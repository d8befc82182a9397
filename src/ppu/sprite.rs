#![doc = r#"
PPU sprite output

Responsibilities
- Pick the sprite pixel for a screen column from the slots fetched on the
  previous line.
- Bit-reversal helper for horizontal flip (`reverse8`).

Notes
- Slots are in OAM order, so the first opaque slot wins.
- A slot covers columns `x..x + 8`; sprites do not wrap around the right edge.
- Slot 0 is sprite 0 only when OAM entry 0 was selected for this line.
"#]

use super::Ppu;
use super::oam_eval::{ATTR_BEHIND_BACKGROUND, ATTR_PALETTE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::ppu) struct SpritePixel {
    /// 1..=3
    pub(in crate::ppu) pattern: u8,
    pub(in crate::ppu) palette: u8,
    pub(in crate::ppu) behind_background: bool,
    pub(in crate::ppu) sprite_zero: bool,
}

impl Ppu {
    /// Opaque sprite pixel at column `x`, if any.
    pub(in crate::ppu) fn sprite_pixel(&self, x: u8) -> Option<SpritePixel> {
        let count = self.sprites.count as usize;
        self.sprites.slots[..count].iter().enumerate().find_map(|(i, slot)| {
            let offset = x.checked_sub(slot.x)?;
            if offset >= 8 {
                return None;
            }
            let shift = 7 - offset;
            let pattern = ((slot.pattern_hi >> shift) & 1) << 1 | ((slot.pattern_lo >> shift) & 1);
            (pattern != 0).then_some(SpritePixel {
                pattern,
                palette: slot.attribute & ATTR_PALETTE,
                behind_background: slot.attribute & ATTR_BEHIND_BACKGROUND != 0,
                sprite_zero: i == 0 && self.sprites.zero_in_line,
            })
        })
    }
}

/// Bit-reversal helper for horizontal flip.
#[inline]
pub(in crate::ppu) fn reverse8(v: u8) -> u8 {
    let mut x = v;
    x = (x & 0xF0) >> 4 | (x & 0x0F) << 4;
    x = (x & 0xCC) >> 2 | (x & 0x33) << 2;
    x = (x & 0xAA) >> 1 | (x & 0x55) << 1;
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::oam_eval::SpriteSlot;
    use crate::test_utils::test_ppu;

    #[test]
    fn reverse8_matches_builtin() {
        for v in 0..=255u8 {
            assert_eq!(reverse8(v), v.reverse_bits());
        }
    }

    #[test]
    fn first_opaque_slot_wins() {
        let mut p = test_ppu();
        p.sprites.count = 2;
        p.sprites.zero_in_line = true;
        // Slot 0 transparent in its first column, slot 1 solid.
        p.sprites.slots[0] = SpriteSlot {
            pattern_lo: 0b0111_1111,
            pattern_hi: 0,
            attribute: 0x01,
            x: 10,
        };
        p.sprites.slots[1] = SpriteSlot {
            pattern_lo: 0xFF,
            pattern_hi: 0xFF,
            attribute: 0x22,
            x: 10,
        };

        let at10 = p.sprite_pixel(10).unwrap();
        assert_eq!(at10.pattern, 3);
        assert_eq!(at10.palette, 2);
        assert!(at10.behind_background);
        assert!(!at10.sprite_zero);

        let at11 = p.sprite_pixel(11).unwrap();
        assert_eq!(at11.pattern, 1);
        assert!(at11.sprite_zero);

        assert!(p.sprite_pixel(9).is_none());
        assert!(p.sprite_pixel(18).is_none());
    }

    #[test]
    fn slots_beyond_count_are_ignored() {
        let mut p = test_ppu();
        p.sprites.slots[0] = SpriteSlot {
            pattern_lo: 0xFF,
            pattern_hi: 0,
            attribute: 0,
            x: 0,
        };
        assert!(p.sprite_pixel(0).is_none());
    }
}
