/*!
Mapper subsystem: address translation for cartridge space.

Purpose:
- Translate CPU addresses in $8000-$FFFF into offsets of the PRG image.
- Translate PPU addresses in $0000-$1FFF into offsets of the CHR image (or CHR RAM).
- Report the nametable mirroring the board wires up; the PPU bus consumes it once at setup.

A mapper is a pure function of its construction parameters: both buses hold a
shared handle and consult it per access. Only NROM (mapper 0) is implemented;
`mapper_for` reports every other number as `UnsupportedMapper`.
*/

use std::rc::Rc;

use log::{info, warn};

use crate::cartridge::{CHR_WINDOW, CartridgeImage, Mirroring, PRG_WINDOW};
use crate::error::EmuError;

/// Common interface for cartridge address translation.
///
/// Both methods take full, unmasked bus addresses and return `None` for
/// addresses outside the mapper's window.
pub trait Mapper {
    /// Mapper numeric identifier (0 for NROM).
    fn id(&self) -> u16;

    /// CPU address to PRG image offset.
    fn map_cpu(&self, addr: u16) -> Option<usize>;

    /// PPU address to CHR offset.
    fn map_ppu(&self, addr: u16) -> Option<usize>;

    /// Nametable mirroring requested by the board.
    fn mirroring(&self) -> Mirroring;
}

/// NROM (mapper 0).
///
/// - PRG: images smaller than the 32 KiB window repeat across it.
/// - CHR: 8 KiB ROM, or 8 KiB RAM when the image carries none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nrom {
    prg_len: usize,
    chr_len: usize,
    mirroring: Mirroring,
}

impl Nrom {
    pub fn new(prg_len: usize, chr_len: usize, mirroring: Mirroring) -> Result<Self, EmuError> {
        if prg_len == 0 {
            return Err(EmuError::BusLayout("NROM needs a non-empty PRG image".into()));
        }
        if prg_len > PRG_WINDOW {
            return Err(EmuError::BusLayout(format!(
                "NROM PRG image of {prg_len} bytes exceeds the 32 KiB window"
            )));
        }
        Ok(Self {
            prg_len,
            chr_len: if chr_len == 0 { CHR_WINDOW } else { chr_len },
            mirroring,
        })
    }
}

impl Mapper for Nrom {
    fn id(&self) -> u16 {
        0
    }

    #[inline]
    fn map_cpu(&self, addr: u16) -> Option<usize> {
        if addr < 0x8000 {
            return None;
        }
        Some((addr as usize - 0x8000) % self.prg_len)
    }

    #[inline]
    fn map_ppu(&self, addr: u16) -> Option<usize> {
        if addr as usize >= CHR_WINDOW {
            return None;
        }
        Some(addr as usize % self.chr_len)
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

/// Build the mapper a cartridge image asks for.
pub fn mapper_for(image: &CartridgeImage) -> Result<Rc<dyn Mapper>, EmuError> {
    match image.mapper_id {
        0 => {
            let nrom = Nrom::new(image.prg_rom.len(), image.chr_rom.len(), image.mirroring)?;
            info!(
                "mapper 0 (NROM): PRG {} bytes, CHR {} bytes{}, {:?} mirroring",
                image.prg_rom.len(),
                nrom.chr_len,
                if image.uses_chr_ram() { " (RAM)" } else { "" },
                image.mirroring
            );
            Ok(Rc::new(nrom))
        }
        other => {
            warn!("cartridge requests unsupported mapper {other}");
            Err(EmuError::UnsupportedMapper(other))
        }
    }
}
