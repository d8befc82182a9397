/*!
Master clock shared by the CPU and PPU.

Purpose
- Keep one monotonically increasing master-cycle counter and derive both CPU
  cycles and PPU dots from it through the region dividers (NTSC 12/4, PAL 16/5).
- Report, after each batch of CPU cycles, exactly how many PPU dots became due
  so the orchestrator can run them in order before the next instruction.

Fractional ratios (PAL's 3.2 dots per cycle) fall out of the integer dividers:
dots are never dropped, merely carried into the next batch.
*/

use crate::config::Region;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasterClock {
    cpu_divider: u64,
    ppu_divider: u64,
    master: u64,
    cpu_cycles: u64,
    ppu_dots: u64,
}

impl MasterClock {
    pub fn new(region: Region) -> Self {
        Self {
            cpu_divider: region.cpu_divider(),
            ppu_divider: region.ppu_divider(),
            master: 0,
            cpu_cycles: 0,
            ppu_dots: 0,
        }
    }

    /// Advance by `cycles` CPU cycles; returns the PPU dots now due.
    pub fn advance_cpu(&mut self, cycles: u32) -> u32 {
        self.cpu_cycles += cycles as u64;
        self.master += cycles as u64 * self.cpu_divider;
        let due = self.master / self.ppu_divider;
        let dots = due - self.ppu_dots;
        self.ppu_dots = due;
        dots as u32
    }

    #[inline]
    pub fn master_cycles(&self) -> u64 {
        self.master
    }

    #[inline]
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    #[inline]
    pub fn ppu_dots(&self) -> u64 {
        self.ppu_dots
    }

    pub fn reset(&mut self) {
        self.master = 0;
        self.cpu_cycles = 0;
        self.ppu_dots = 0;
    }
}
