/*!
Cartridge image record.

The core never parses a container format: callers hand over an already
decoded record carrying the PRG image, the CHR image (empty when the board
uses CHR RAM), the mapper number and the nametable mirroring mode.

NROM sizing rules applied downstream:
- PRG of 16 KiB (NROM-128) is mirrored across $8000-$FFFF; 32 KiB maps directly.
- Smaller PRG images (test programs) are mirrored in the same way.
- Empty CHR allocates 8 KiB of CHR RAM on the PPU bus.
*/

/// Nametable arrangement requested by the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mirroring {
    /// $2000/$2400 share one page, $2800/$2C00 the other.
    #[default]
    Horizontal,
    /// $2000/$2800 share one page, $2400/$2C00 the other.
    Vertical,
}

/// Size of one CHR pattern space (two 4 KiB pattern tables).
pub const CHR_WINDOW: usize = 0x2000;
/// Size of the CPU-side PRG window at $8000-$FFFF.
pub const PRG_WINDOW: usize = 0x8000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartridgeImage {
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
    pub mapper_id: u16,
    pub mirroring: Mirroring,
}

impl CartridgeImage {
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mapper_id: u16, mirroring: Mirroring) -> Self {
        Self {
            prg_rom,
            chr_rom,
            mapper_id,
            mirroring,
        }
    }

    /// Whether the PPU should allocate CHR RAM instead of exposing `chr_rom`.
    #[inline]
    pub fn uses_chr_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }
}
