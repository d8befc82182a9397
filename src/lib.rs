#![doc = r#"
famicore library crate.

Cycle-stepped core of a 6502-based video-game console: CPU, PPU and the
region-composed memory buses that connect them to a cartridge image.

Modules:
- bus: MemoryBus/BusBuilder, CPU and PPU memory maps, register hooks, OAM DMA, master clock
- cartridge: parsed cartridge record consumed by the core
- config: region timing table and session configuration
- console: orchestrator stepping CPU and PPU in lockstep for one session
- cpu: 6502 core (instruction table, addressing, dispatch, disassembly)
- error: EmuError and its three-way taxonomy
- mapper: Mapper trait and NROM (mapper 0)
- ppu: dot-stepped PPU (registers, scroll, fetch pipelines, sprites, output)

Running a cartridge:

```
use famicore::{CartridgeImage, Console, EmulatorConfig, Mirroring, NullSink};

// 16 KiB of NOPs with the reset vector pointing at $8000.
let mut prg = vec![0xEA; 0x4000];
prg[0x3FFC..0x3FFE].copy_from_slice(&[0x00, 0x80]);
let image = CartridgeImage::new(prg, Vec::new(), 0, Mirroring::Horizontal);

let mut console = Console::new(image, &EmulatorConfig::default())?;
console.reset(&mut NullSink)?;
assert_eq!(console.step(&mut NullSink)?, 2);
assert_eq!(console.cpu().pc(), 0x8001);
# Ok::<(), famicore::EmuError>(())
```

In tests, shared builders are available under `crate::test_utils`.
"#]

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod cpu;
pub mod error;
pub mod mapper;
pub mod ppu;

// Re-export commonly used types at the crate root for convenience.
pub use cartridge::{CartridgeImage, Mirroring};
pub use config::{EmulatorConfig, Region};
pub use console::Console;
pub use cpu::{Cpu, CpuState, Status};
pub use error::{EmuError, ErrorKind};
pub use ppu::{FrameBuffer, NullSink, PixelSink, PpuSnapshot};

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
