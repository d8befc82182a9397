/*!
PPU core: scanline/dot state machine with a per-dot background and sprite
pipeline.

STRUCTURE:
- `Ppu` owns its 14-bit address space (`MemoryBus` built by
  `bus::build_ppu_bus`), the CPU-visible registers, the loopy `v`/`t`/`x`/`w`
  scroll state, primary OAM and the pipelines.
- Child modules implement inherent methods on `Ppu` and reach its private
  fields directly:
  * `registers.rs` - register types and $2000-$2007 semantics
  * `scroll.rs`    - `VramAddr` (v/t) increments and copies
  * `memory.rs`    - OAMDATA, OAM DMA sink, debugger accessors
  * `fetch.rs`     - background fetch sequence and shifters
  * `oam_eval.rs`  - secondary OAM clear / evaluate / fetch
  * `sprite.rs`    - sprite pixel selection
  * `renderer.rs`  - `tick`: timing, composition, vblank/NMI, odd-frame skip
  * `output.rs`    - `PixelSink`, `FrameBuffer`, system palette

TIMING:
- 341 dots per scanline. Lines 0-239 visible, 240 post-render, 241 to the
  line before pre-render are vblank, pre-render is the region's last line.
- Power-on position is the pre-render line, dot 0.
*/

use crate::bus::MemoryBus;
use crate::config::Region;

pub mod output;
pub mod registers;
pub mod scroll;

mod fetch;
mod memory;
mod oam_eval;
mod renderer;
mod sprite;

pub use memory::OAM_SIZE;
pub use output::{
    BYTES_PER_PIXEL, FrameBuffer, NES_PALETTE, NullSink, PixelSink, SCREEN_HEIGHT, SCREEN_WIDTH,
};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::VramAddr;

use fetch::Background;
use oam_eval::Sprites;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const LAST_DOT: u16 = DOTS_PER_SCANLINE - 1;
pub const VISIBLE_SCANLINES: u16 = 240;

/// Read-only view for debuggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PpuSnapshot {
    pub scanline: u16,
    pub dot: u16,
    pub frame: u64,
    pub ctrl: PpuCtrl,
    pub mask: PpuMask,
    pub status: PpuStatus,
    pub oam_addr: u8,
    pub v: VramAddr,
    pub t: VramAddr,
    pub fine_x: u8,
    pub w: bool,
}

#[derive(Debug)]
pub struct Ppu {
    region: Region,
    bus: MemoryBus,

    ctrl: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,
    oam_addr: u8,
    oam: [u8; OAM_SIZE],

    v: VramAddr,
    t: VramAddr,
    fine_x: u8,
    w: bool,
    read_buffer: u8,
    // Last value driven on the register window.
    io_latch: u8,

    scanline: u16,
    dot: u16,
    frame: u64,
    nmi_pending: bool,
    frame_complete: bool,

    background: Background,
    sprites: Sprites,
}

impl Ppu {
    pub fn new(region: Region, bus: MemoryBus) -> Self {
        Self {
            region,
            bus,
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            oam_addr: 0,
            oam: [0; OAM_SIZE],
            v: VramAddr::default(),
            t: VramAddr::default(),
            fine_x: 0,
            w: false,
            read_buffer: 0,
            io_latch: 0,
            scanline: region.pre_render_line(),
            dot: 0,
            frame: 0,
            nmi_pending: false,
            frame_complete: false,
            background: Background::default(),
            sprites: Sprites::default(),
        }
    }

    /// Reset line: control, mask, scroll latches and the read buffer clear,
    /// timing restarts at the pre-render line. OAM, VRAM and status survive.
    pub fn reset(&mut self) {
        self.ctrl = PpuCtrl::empty();
        self.mask = PpuMask::empty();
        self.t = VramAddr::default();
        self.fine_x = 0;
        self.w = false;
        self.read_buffer = 0;
        self.scanline = self.region.pre_render_line();
        self.dot = 0;
        self.frame = 0;
        self.nmi_pending = false;
        self.frame_complete = false;
        self.background = Background::default();
        self.sprites = Sprites::default();
    }

    #[inline]
    pub fn region(&self) -> Region {
        self.region
    }

    #[inline]
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    #[inline]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Frames started since power-on or reset.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn ctrl(&self) -> PpuCtrl {
        self.ctrl
    }

    #[inline]
    pub fn mask(&self) -> PpuMask {
        self.mask
    }

    #[inline]
    pub fn status(&self) -> PpuStatus {
        self.status
    }

    #[inline]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Consume a pending NMI request.
    #[inline]
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// Consume the vblank-start latch.
    #[inline]
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    pub fn snapshot(&self) -> PpuSnapshot {
        PpuSnapshot {
            scanline: self.scanline,
            dot: self.dot,
            frame: self.frame,
            ctrl: self.ctrl,
            mask: self.mask,
            status: self.status,
            oam_addr: self.oam_addr,
            v: self.v,
            t: self.t,
            fine_x: self.fine_x,
            w: self.w,
        }
    }
}
