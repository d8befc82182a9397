//! Session configuration and region timing.

use crate::ppu::DOTS_PER_SCANLINE;

/// Video region: selects master-clock dividers and frame geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Region {
    /// 262 scanlines, 3 PPU dots per CPU cycle.
    #[default]
    Ntsc,
    /// 312 scanlines, 3.2 PPU dots per CPU cycle.
    Pal,
}

impl Region {
    /// Master crystal frequency in Hz.
    pub const fn crystal_hz(self) -> u64 {
        match self {
            Region::Ntsc => 21_477_272,
            Region::Pal => 26_601_712,
        }
    }

    /// Master clocks per CPU cycle.
    pub const fn cpu_divider(self) -> u64 {
        match self {
            Region::Ntsc => 12,
            Region::Pal => 16,
        }
    }

    /// Master clocks per PPU dot.
    pub const fn ppu_divider(self) -> u64 {
        match self {
            Region::Ntsc => 4,
            Region::Pal => 5,
        }
    }

    pub const fn scanlines_per_frame(self) -> u16 {
        match self {
            Region::Ntsc => 262,
            Region::Pal => 312,
        }
    }

    /// First vblank scanline; the vblank flag rises at its dot 1.
    pub const fn vblank_line(self) -> u16 {
        241
    }

    /// Pre-render scanline number (last scanline of the frame).
    pub const fn pre_render_line(self) -> u16 {
        self.scanlines_per_frame() - 1
    }

    /// Whether the pre-render line drops its last dot on odd frames.
    pub const fn skips_odd_frame_dot(self) -> bool {
        matches!(self, Region::Ntsc)
    }

    /// Nominal frames per second, ignoring the skipped odd-frame dot.
    pub fn frame_rate(self) -> f64 {
        let master_per_frame =
            self.scanlines_per_frame() as u64 * DOTS_PER_SCANLINE as u64 * self.ppu_divider();
        self.crystal_hz() as f64 / master_per_frame as f64
    }
}

/// Parameters fixed for the lifetime of one `Console`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmulatorConfig {
    pub region: Region,
}

impl EmulatorConfig {
    pub fn new(region: Region) -> Self {
        Self { region }
    }
}
