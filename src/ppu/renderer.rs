#![doc = r#"
PPU renderer module

Responsibilities
- `Ppu::tick`: advance one dot. Runs the fetch pipelines on render lines,
  composes one pixel per visible dot, raises vblank/NMI and clears the frame
  flags on the pre-render line.
- Dot/scanline/frame progression, including the odd-frame skip.

Per-dot order on render lines (rendering enabled)
1. shift background registers (dots 2-257, 322-337)
2. background fetch step, sprite evaluation step
3. vertical copy from `t` (pre-render dots 280-304)
4. pixel composition (visible dots 1-256)

Pixel composition
- Background and sprite pixels are each forced transparent when their layer
  is disabled or when the column is inside a masked left-8 strip.
- Transparent + transparent -> backdrop ($3F00). One opaque layer wins.
  Both opaque -> sprite unless its priority bit puts it behind.
- Sprite-0 hit needs both pixels opaque, sprite 0 in slot 0 and x != 255.
  It stays set until the pre-render line, so it fires at most once per frame.
- Output is the palette byte & $3F, then & $30 under greyscale.

Flags
- (vblank line, dot 1): VBLANK set, NMI requested if enabled, frame latch set.
- (pre-render, dot 1): VBLANK, SPRITE_ZERO_HIT and SPRITE_OVERFLOW cleared.
- Odd frames skip the pre-render line's last dot when rendering is enabled
  and the region has the skip (NTSC).
"#]

use log::debug;

use super::output::PixelSink;
use super::registers::{PpuCtrl, PpuMask, PpuStatus};
use super::{LAST_DOT, Ppu, VISIBLE_SCANLINES};
use crate::error::EmuError;

const BACKDROP: u16 = 0x3F00;
const SPRITE_PALETTES: u16 = 0x3F10;

impl Ppu {
    /// Advance one PPU dot.
    pub fn tick(&mut self, sink: &mut dyn PixelSink) -> Result<(), EmuError> {
        let pre_render = self.region.pre_render_line();
        let line = self.scanline;
        let dot = self.dot;
        let visible = line < VISIBLE_SCANLINES;
        let rendering = self.mask.rendering_enabled();

        if visible || line == pre_render {
            if line == pre_render && dot == 1 {
                self.status.remove(
                    PpuStatus::VBLANK | PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW,
                );
            }
            if rendering {
                if (2..=257).contains(&dot) || (322..=337).contains(&dot) {
                    self.background.shift();
                }
                self.background_fetch()?;
                self.sprite_evaluation(visible)?;
                if line == pre_render && (280..=304).contains(&dot) {
                    self.v.copy_vertical(self.t);
                }
            }
            if visible && (1..=256).contains(&dot) {
                self.compose_pixel(sink, (dot - 1) as u8, line as u8)?;
            }
        } else if line == self.region.vblank_line() && dot == 1 {
            self.status.insert(PpuStatus::VBLANK);
            if self.ctrl.contains(PpuCtrl::NMI_ENABLE) {
                self.nmi_pending = true;
            }
            self.frame_complete = true;
            debug!("PPU frame {} reached vblank", self.frame);
        }

        self.advance(rendering);
        Ok(())
    }

    fn compose_pixel(&mut self, sink: &mut dyn PixelSink, x: u8, y: u8) -> Result<(), EmuError> {
        let (bg_pattern, bg_palette) = if self.mask.background_visible(x) {
            self.background.pixel(self.fine_x)
        } else {
            (0, 0)
        };
        let sprite = if self.mask.sprites_visible(x) {
            self.sprite_pixel(x)
        } else {
            None
        };

        let background_addr = BACKDROP + bg_palette as u16 * 4 + bg_pattern as u16;
        let addr = match sprite {
            Some(s) if bg_pattern != 0 => {
                if s.sprite_zero && x != 255 {
                    self.status.insert(PpuStatus::SPRITE_ZERO_HIT);
                }
                if s.behind_background {
                    background_addr
                } else {
                    SPRITE_PALETTES + s.palette as u16 * 4 + s.pattern as u16
                }
            }
            Some(s) => SPRITE_PALETTES + s.palette as u16 * 4 + s.pattern as u16,
            None if bg_pattern != 0 => background_addr,
            None => BACKDROP,
        };

        let mut color = self.bus.read(addr)? & 0x3F;
        if self.mask.contains(PpuMask::GREYSCALE) {
            color &= 0x30;
        }
        sink.put_pixel(x, y, color);
        Ok(())
    }

    fn advance(&mut self, rendering: bool) {
        let pre_render = self.region.pre_render_line();
        self.dot += 1;
        if self.scanline == pre_render
            && self.dot == LAST_DOT
            && rendering
            && self.frame & 1 == 1
            && self.region.skips_odd_frame_dot()
        {
            self.dot += 1;
        }
        if self.dot > LAST_DOT {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > pre_render {
                self.scanline = 0;
                self.frame += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Region;
    use crate::ppu::registers::{PPUCTRL, PPUSCROLL, PPUSTATUS};
    use crate::ppu::{FrameBuffer, NullSink};
    use crate::test_utils::{test_ppu, test_ppu_for};

    const DOTS_PER_FRAME: u64 = 262 * 341;

    fn run_to(p: &mut Ppu, sink: &mut dyn PixelSink, scanline: u16, dot: u16) {
        while !(p.scanline == scanline && p.dot == dot) {
            p.tick(sink).unwrap();
        }
    }

    /// Dots from one vblank start to the next.
    fn frame_length(p: &mut Ppu) -> u64 {
        let mut n = 0;
        loop {
            p.tick(&mut NullSink).unwrap();
            n += 1;
            if p.take_frame_complete() {
                return n;
            }
        }
    }

    /// Nametable 0 filled with tile 1 (solid low plane), backdrop $0F, bg color 1 $16,
    /// sprite palette 0 color 1 $2A.
    fn solid_background(p: &mut Ppu) {
        for addr in 0x2000..0x23C0 {
            p.poke_vram(addr, 1).unwrap();
        }
        for row in 0..8 {
            p.poke_vram(0x0010 + row, 0xFF).unwrap();
        }
        p.poke_vram(0x3F00, 0x0F).unwrap();
        p.poke_vram(0x3F01, 0x16).unwrap();
        p.poke_vram(0x3F11, 0x2A).unwrap();
    }

    fn place_sprite_zero(p: &mut Ppu, y: u8, attr: u8, x: u8) {
        p.oam.fill(0xF0);
        p.oam[0..4].copy_from_slice(&[y, 1, attr, x]);
    }

    #[test]
    fn vblank_rises_at_dot_one_and_requests_nmi() {
        let mut p = test_ppu();
        p.write_register(PPUCTRL, 0x80).unwrap();
        run_to(&mut p, &mut NullSink, 241, 1);
        assert!(!p.status.contains(PpuStatus::VBLANK));
        assert!(!p.nmi_pending());
        p.tick(&mut NullSink).unwrap();
        assert!(p.status.contains(PpuStatus::VBLANK));
        assert!(p.take_nmi());
        assert!(p.take_frame_complete());
        assert!(!p.take_frame_complete());
    }

    #[test]
    fn vblank_without_nmi_enable_does_not_request() {
        let mut p = test_ppu();
        run_to(&mut p, &mut NullSink, 241, 2);
        assert!(p.status.contains(PpuStatus::VBLANK));
        assert!(!p.nmi_pending());
    }

    #[test]
    fn pre_render_clears_frame_flags() {
        let mut p = test_ppu();
        run_to(&mut p, &mut NullSink, 250, 0);
        p.status.insert(PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW);
        run_to(&mut p, &mut NullSink, 261, 1);
        assert_eq!(p.status.bits(), 0xE0);
        p.tick(&mut NullSink).unwrap();
        assert!(p.status.is_empty());
    }

    #[test]
    fn status_read_in_vblank_clears_flag() {
        let mut p = test_ppu();
        run_to(&mut p, &mut NullSink, 245, 0);
        assert_eq!(p.read_register(PPUSTATUS).unwrap() & 0x80, 0x80);
        assert_eq!(p.read_register(PPUSTATUS).unwrap() & 0x80, 0x00);
    }

    #[test]
    fn odd_frames_are_one_dot_shorter_when_rendering() {
        let mut p = test_ppu();
        p.mask = PpuMask::SHOW_BACKGROUND;
        frame_length(&mut p);
        let a = frame_length(&mut p);
        let b = frame_length(&mut p);
        let c = frame_length(&mut p);
        assert_eq!(a + b, 2 * DOTS_PER_FRAME - 1);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn no_skip_with_rendering_disabled() {
        let mut p = test_ppu();
        frame_length(&mut p);
        assert_eq!(frame_length(&mut p), DOTS_PER_FRAME);
        assert_eq!(frame_length(&mut p), DOTS_PER_FRAME);
    }

    #[test]
    fn pal_frames_are_312_lines_without_skip() {
        let mut p = test_ppu_for(Region::Pal);
        p.mask = PpuMask::SHOW_BACKGROUND;
        frame_length(&mut p);
        assert_eq!(frame_length(&mut p), 312 * 341);
        assert_eq!(frame_length(&mut p), 312 * 341);
    }

    #[test]
    fn every_visible_dot_emits_one_pixel() {
        let mut p = test_ppu();
        let mut count = 0usize;
        let mut last = (0, 0);
        let mut sink = |x: u8, y: u8, _c: u8| {
            count += 1;
            last = (x, y);
        };
        run_to(&mut p, &mut sink, 240, 0);
        assert_eq!(count, 256 * 240);
        assert_eq!(last, (255, 239));
    }

    #[test]
    fn sprite_zero_hit_fires_on_first_overlap() {
        let mut p = test_ppu();
        solid_background(&mut p);
        place_sprite_zero(&mut p, 30, 0, 100);
        p.mask = PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES;
        run_to(&mut p, &mut NullSink, 31, 101);
        assert!(!p.status.contains(PpuStatus::SPRITE_ZERO_HIT));
        p.tick(&mut NullSink).unwrap();
        assert!(p.status.contains(PpuStatus::SPRITE_ZERO_HIT));
    }

    #[test]
    fn sprite_zero_hit_respects_left_clip_and_last_column() {
        for (x, mask) in [
            (0u8, PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES | PpuMask::SHOW_BACKGROUND_LEFT),
            (255u8, PpuMask::all()),
        ] {
            let mut p = test_ppu();
            solid_background(&mut p);
            place_sprite_zero(&mut p, 30, 0, x);
            p.mask = mask;
            run_to(&mut p, &mut NullSink, 40, 0);
            assert!(!p.status.contains(PpuStatus::SPRITE_ZERO_HIT), "x = {x}");
        }
    }

    #[test]
    fn sprite_zero_hit_needs_background() {
        let mut p = test_ppu();
        place_sprite_zero(&mut p, 30, 0, 100);
        p.mask = PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES;
        // Pattern for the sprite only; nametable still points at the blank tile 0.
        for row in 0..8 {
            p.poke_vram(0x0010 + row, 0xFF).unwrap();
        }
        run_to(&mut p, &mut NullSink, 40, 0);
        assert!(!p.status.contains(PpuStatus::SPRITE_ZERO_HIT));
    }

    #[test]
    fn sprite_priority_selects_front_or_behind() {
        for (attr, expected) in [(0x00u8, 0x2Au8), (0x20, 0x16)] {
            let mut p = test_ppu();
            solid_background(&mut p);
            place_sprite_zero(&mut p, 30, attr, 100);
            p.mask = PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES;
            let mut fb = FrameBuffer::new();
            run_to(&mut p, &mut fb, 240, 0);
            assert_eq!(fb.pixel(100, 31), expected);
            assert_eq!(fb.pixel(99, 31), 0x16);
            assert_eq!(fb.pixel(100, 30), 0x16);
        }
    }

    #[test]
    fn transparent_background_shows_backdrop_or_sprite() {
        let mut p = test_ppu();
        solid_background(&mut p);
        // Blank the nametable again: background transparent everywhere.
        for addr in 0x2000..0x23C0 {
            p.poke_vram(addr, 0).unwrap();
        }
        place_sprite_zero(&mut p, 30, 0x20, 100);
        p.mask = PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES;
        let mut fb = FrameBuffer::new();
        run_to(&mut p, &mut fb, 240, 0);
        // Behind-priority sprite still shows over a transparent background.
        assert_eq!(fb.pixel(100, 31), 0x2A);
        assert_eq!(fb.pixel(50, 50), 0x0F);
    }

    #[test]
    fn left_column_masking_and_greyscale() {
        let mut p = test_ppu();
        solid_background(&mut p);
        p.mask = PpuMask::SHOW_BACKGROUND | PpuMask::GREYSCALE;
        let mut fb = FrameBuffer::new();
        run_to(&mut p, &mut fb, 240, 0);
        assert_eq!(fb.pixel(7, 10), 0x0F & 0x30);
        assert_eq!(fb.pixel(8, 10), 0x16 & 0x30);
    }

    #[test]
    fn fine_and_coarse_scroll_shift_the_background() {
        // Column 0 blank, column 1 solid.
        let setup = |scroll_x: u8| {
            let mut p = test_ppu();
            for row in 0..8 {
                p.poke_vram(0x0010 + row, 0xFF).unwrap();
            }
            for tile_row in 0..30u16 {
                p.poke_vram(0x2001 + tile_row * 32, 1).unwrap();
            }
            p.poke_vram(0x3F00, 0x0F).unwrap();
            p.poke_vram(0x3F01, 0x16).unwrap();
            p.write_register(PPUSCROLL, scroll_x).unwrap();
            p.write_register(PPUSCROLL, 0).unwrap();
            p.mask = PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_BACKGROUND_LEFT;
            let mut fb = FrameBuffer::new();
            run_to(&mut p, &mut fb, 240, 0);
            fb
        };

        let fb = setup(0);
        assert_eq!(fb.pixel(7, 10), 0x0F);
        assert_eq!(fb.pixel(8, 10), 0x16);
        assert_eq!(fb.pixel(16, 10), 0x0F);

        let fb = setup(4);
        assert_eq!(fb.pixel(3, 10), 0x0F);
        assert_eq!(fb.pixel(4, 10), 0x16);
        assert_eq!(fb.pixel(11, 10), 0x16);
        assert_eq!(fb.pixel(12, 10), 0x0F);

        let fb = setup(8);
        assert_eq!(fb.pixel(0, 10), 0x16);
        assert_eq!(fb.pixel(8, 10), 0x0F);
    }

    #[test]
    fn overflow_flag_rises_with_nine_sprites_on_a_line() {
        let mut p = test_ppu();
        p.mask = PpuMask::SHOW_SPRITES;
        p.oam.fill(0xF0);
        for i in 0..9 {
            p.oam[i * 4] = 100;
        }
        run_to(&mut p, &mut NullSink, 101, 0);
        assert!(p.status.contains(PpuStatus::SPRITE_OVERFLOW));
        // Cleared again on the next pre-render line.
        run_to(&mut p, &mut NullSink, 261, 2);
        assert!(!p.status.contains(PpuStatus::SPRITE_OVERFLOW));
    }
}
