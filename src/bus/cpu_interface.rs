/*!
CPU-visible memory map.

| range           | contents                                              |
|-----------------|-------------------------------------------------------|
| $0000-$07FF     | 2 KiB work RAM                                        |
| $0800-$1FFF     | mirrors of work RAM                                   |
| $2000-$2007     | PPU registers (hooked)                                |
| $2008-$3FFF     | mirrors of the PPU registers every 8 bytes            |
| $4000-$401F     | APU / I/O latches (plain storage; $4014 hooked)       |
| $4020-$5FFF     | unmapped (open bus)                                   |
| $6000-$7FFF     | 8 KiB PRG RAM                                         |
| $8000-$FFFF     | PRG image through the mapper                          |
*/

use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::{BusBuilder, CartSpace, IoPort, MemoryBus};
use crate::bus::dma::OAM_DMA_REGISTER;
use crate::error::{BusKind, EmuError};
use crate::mapper::Mapper;

pub const CPU_BUS_SIZE: u32 = 0x1_0000;

pub const RAM_SIZE: usize = 0x0800;
pub const RAM_WINDOW: u32 = 0x2000;

pub const PPU_REGISTERS_START: u32 = 0x2000;
pub const PPU_REGISTERS_END: u32 = 0x4000;
pub const PPU_REGISTER_STRIDE: u32 = 8;

pub const IO_START: u32 = 0x4000;
pub const IO_SIZE: usize = 0x20;

pub const PRG_RAM_START: u32 = 0x6000;
pub const PRG_RAM_SIZE: usize = 0x2000;

pub const PRG_START: u32 = 0x8000;
pub const PRG_WINDOW: u32 = 0x8000;

/// Region names, for `MemoryBus::region_named`.
pub const RAM_REGION: &str = "ram";
pub const PRG_RAM_REGION: &str = "prg_ram";
pub const PRG_ROM_REGION: &str = "prg_rom";

/// Assemble the CPU bus.
///
/// `ppu` receives the register window, `dma` the page-select register at $4014.
pub fn build_cpu_bus(
    prg_rom: Vec<u8>,
    mapper: Rc<dyn Mapper>,
    ppu: Rc<RefCell<dyn IoPort>>,
    dma: Rc<RefCell<dyn IoPort>>,
) -> Result<MemoryBus, EmuError> {
    let mut b = BusBuilder::new(BusKind::Cpu, CPU_BUS_SIZE);

    let ram = b.region(RAM_REGION, vec![0; RAM_SIZE], true);
    b.map_mirrored(ram, 0x0000, RAM_WINDOW)?;

    b.hook(PPU_REGISTERS_START, PPU_REGISTERS_END, PPU_REGISTER_STRIDE, ppu)?;

    let io = b.region("io", vec![0; IO_SIZE], true);
    b.map(io, IO_START, IO_SIZE as u32)?;
    b.hook(OAM_DMA_REGISTER as u32, OAM_DMA_REGISTER as u32 + 1, 1, dma)?;

    let prg_ram = b.region(PRG_RAM_REGION, vec![0; PRG_RAM_SIZE], true);
    b.map(prg_ram, PRG_RAM_START, PRG_RAM_SIZE as u32)?;

    let prg = b.region(PRG_ROM_REGION, prg_rom, false);
    b.map_cartridge(prg, PRG_START, PRG_WINDOW, CartSpace::Prg, mapper)?;

    Ok(b.build())
}
