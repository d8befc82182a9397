//! Shared test utilities.
//!
//! - `FlatBus`: 64 KiB of plain writable memory implementing `Bus`, with an
//!   optional write log for checking bus choreography.
//! - `setup_cpu`: a power-on CPU whose PC sits at $8000 with `prg` loaded there.
//! - `program_image`: a 16 KiB NROM cartridge image with the given program at
//!   $8000 and the three CPU vectors filled in.
//! - `test_ppu`: a power-on PPU over CHR RAM with horizontal mirroring.
//!
//! Vector layout for a 16 KiB PRG bank: NMI at $3FFA, RESET at $3FFC and
//! IRQ/BRK at $3FFE (mirrored to $FFFA-$FFFF).

#![allow(dead_code)]

use std::rc::Rc;

use crate::bus::{Bus, build_ppu_bus};
use crate::cartridge::{CartridgeImage, Mirroring};
use crate::config::Region;
use crate::cpu::Cpu;
use crate::error::EmuError;
use crate::mapper::Nrom;
use crate::ppu::Ppu;

pub const PROGRAM_START: u16 = 0x8000;
pub const PRG_BANK: usize = 0x4000;

pub struct FlatBus {
    pub mem: Vec<u8>,
    pub log_writes: bool,
    pub writes: Vec<(u16, u8)>,
}

impl FlatBus {
    pub fn new() -> Self {
        Self {
            mem: vec![0; 0x1_0000],
            log_writes: false,
            writes: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Bus for FlatBus {
    fn read(&mut self, addr: u16) -> Result<u8, EmuError> {
        Ok(self.mem[addr as usize])
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmuError> {
        if self.log_writes {
            self.writes.push((addr, value));
        }
        self.mem[addr as usize] = value;
        Ok(())
    }
}

/// Power-on CPU positioned at $8000 over a flat bus holding `prg`.
pub fn setup_cpu(prg: &[u8]) -> (Cpu, FlatBus) {
    let mut bus = FlatBus::new();
    bus.load(PROGRAM_START, prg);
    let mut cpu = Cpu::new();
    cpu.state_mut().pc = PROGRAM_START;
    (cpu, bus)
}

/// Write NMI/RESET/IRQ vectors into the last six bytes of a PRG bank.
pub fn set_vectors(prg: &mut [u8], reset: u16, nmi: u16, irq: u16) {
    let base = prg.len() - 6;
    prg[base..base + 2].copy_from_slice(&nmi.to_le_bytes());
    prg[base + 2..base + 4].copy_from_slice(&reset.to_le_bytes());
    prg[base + 4..base + 6].copy_from_slice(&irq.to_le_bytes());
}

/// 16 KiB NROM image with `program` at $8000, RESET at $8000 and NMI/IRQ at `handler`.
pub fn program_image(program: &[u8], handler: u16) -> CartridgeImage {
    let mut prg = vec![0xEA; PRG_BANK];
    prg[..program.len()].copy_from_slice(program);
    set_vectors(&mut prg, PROGRAM_START, handler, handler);
    CartridgeImage::new(prg, Vec::new(), 0, Mirroring::Horizontal)
}

/// Same as `program_image` with extra code placed at PRG offset `at`.
pub fn program_image_with(program: &[u8], at: usize, extra: &[u8], handler: u16) -> CartridgeImage {
    let mut image = program_image(program, handler);
    image.prg_rom[at..at + extra.len()].copy_from_slice(extra);
    image
}

/// NTSC PPU over 8 KiB CHR RAM, horizontal mirroring.
pub fn test_ppu() -> Ppu {
    test_ppu_for(Region::Ntsc)
}

pub fn test_ppu_for(region: Region) -> Ppu {
    let mapper = Rc::new(Nrom::new(PRG_BANK, 0, Mirroring::Horizontal).unwrap());
    Ppu::new(region, build_ppu_bus(Vec::new(), mapper).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_land_in_last_six_bytes() {
        let mut prg = vec![0u8; PRG_BANK];
        set_vectors(&mut prg, 0x8123, 0x8456, 0x8ABC);
        assert_eq!(&prg[0x3FFA..], &[0x56, 0x84, 0x23, 0x81, 0xBC, 0x8A]);
    }

    #[test]
    fn flat_bus_logs_only_when_asked() {
        let mut bus = FlatBus::new();
        bus.write(0x10, 1).unwrap();
        bus.log_writes = true;
        bus.write(0x11, 2).unwrap();
        assert_eq!(bus.writes, vec![(0x11, 2)]);
        assert_eq!(bus.read_word(0x10).unwrap(), 0x0201);
    }
}
