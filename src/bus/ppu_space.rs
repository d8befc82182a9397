#![doc = r#"
PPU address space (14 bits, $0000-$3FFF).

Layout
- $0000-$1FFF: pattern tables, translated through the mapper into CHR ROM, or
  into 8 KiB of CHR RAM when the cartridge carries no CHR image.
- $2000-$2FFF: four 1 KiB nametable windows backed by 2 KiB of CIRAM. The
  mapper's mirroring mode decides which CIRAM page each window shows:
  * Horizontal: $2000/$2400 -> page 0, $2800/$2C00 -> page 1
  * Vertical:   $2000/$2800 -> page 0, $2400/$2C00 -> page 1
- $3000-$3EFF: mirror of $2000-$2EFF.
- $3F00-$3FFF: 32 bytes of palette RAM repeated every 32 bytes, where
  $3F10/$3F14/$3F18/$3F1C alias $3F00/$3F04/$3F08/$3F0C.

All of this is plain region placement; nothing is decoded per access beyond
the mapper translation for CHR.
"#]

use std::rc::Rc;

use crate::bus::{BusBuilder, CartSpace, MemoryBus};
use crate::cartridge::{CHR_WINDOW, Mirroring};
use crate::error::{BusKind, EmuError};
use crate::mapper::Mapper;

pub const PPU_BUS_SIZE: u32 = 0x4000;

pub const NAMETABLE_START: u32 = 0x2000;
pub const NAMETABLE_SIZE: u32 = 0x0400;
pub const CIRAM_SIZE: usize = 0x0800;

pub const PALETTE_START: u32 = 0x3F00;
pub const PALETTE_SIZE: usize = 0x20;

pub const CHR_REGION: &str = "chr";
pub const CIRAM_REGION: &str = "ciram";
pub const PALETTE_REGION: &str = "palette";

/// CIRAM page shown by nametable window `table` (0..4).
#[inline]
pub fn nametable_page(mirroring: Mirroring, table: u32) -> usize {
    match mirroring {
        Mirroring::Horizontal => (table >> 1) as usize & 1,
        Mirroring::Vertical => table as usize & 1,
    }
}

/// Assemble the PPU bus. An empty `chr` allocates writable CHR RAM.
pub fn build_ppu_bus(chr: Vec<u8>, mapper: Rc<dyn Mapper>) -> Result<MemoryBus, EmuError> {
    let mirroring = mapper.mirroring();
    let mut b = BusBuilder::new(BusKind::Ppu, PPU_BUS_SIZE);

    let chr_is_ram = chr.is_empty();
    let chr_data = if chr_is_ram { vec![0; CHR_WINDOW] } else { chr };
    let chr = b.region(CHR_REGION, chr_data, chr_is_ram);
    b.map_cartridge(chr, 0x0000, CHR_WINDOW as u32, CartSpace::Chr, mapper)?;

    let ciram = b.region(CIRAM_REGION, vec![0; CIRAM_SIZE], true);
    for mirror_base in [0x2000u32, 0x3000] {
        for table in 0..4u32 {
            let start = mirror_base + table * NAMETABLE_SIZE;
            // $3F00 onwards belongs to the palette.
            let len = NAMETABLE_SIZE.min(PALETTE_START - start);
            let page = nametable_page(mirroring, table);
            b.map_slice(
                ciram,
                start,
                len,
                page * NAMETABLE_SIZE as usize,
                NAMETABLE_SIZE as usize,
            )?;
        }
    }

    let palette = b.region(PALETTE_REGION, vec![0; PALETTE_SIZE], true);
    let mut window = PALETTE_START;
    while window < PPU_BUS_SIZE {
        b.map_slice(palette, window, 0x10, 0x00, 0x10)?;
        for entry in 0..4u32 {
            let backdrop = window + 0x10 + entry * 4;
            b.map_slice(palette, backdrop, 1, (entry * 4) as usize, 1)?;
            b.map_slice(palette, backdrop + 1, 3, (0x11 + entry * 4) as usize, 3)?;
        }
        window += PALETTE_SIZE as u32;
    }

    Ok(b.build())
}
