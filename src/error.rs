//! Error taxonomy shared by every core component.
//!
//! All variants are fatal for the session that raised them. `EmuError::kind`
//! folds the concrete variants onto the three categories callers report on.

use std::fmt;

use thiserror::Error;

use crate::cpu::table::{AddrMode, Mnemonic};

/// Which address space an access was issued on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusKind {
    Cpu,
    Ppu,
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::Cpu => f.write_str("CPU"),
            BusKind::Ppu => f.write_str("PPU"),
        }
    }
}

/// Coarse error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed static setup: instruction table or bus layout.
    Configuration,
    /// Access beyond the configured size of a bus.
    AddressOutOfRange,
    /// Cartridge requested a bank-switching scheme that is not implemented.
    UnsupportedMapper,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EmuError {
    #[error("opcode ${opcode:02X} at ${pc:04X} has no instruction table entry")]
    UndefinedOpcode { opcode: u8, pc: u16 },

    #[error("{mnemonic} has no encoding in {mode:?} addressing")]
    UndefinedEncoding { mnemonic: Mnemonic, mode: AddrMode },

    #[error("bus layout: {0}")]
    BusLayout(String),

    #[error("{bus} bus access at ${address:04X} exceeds configured size ${size:04X}")]
    AddressOutOfRange {
        bus: BusKind,
        address: u32,
        size: u32,
    },

    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u16),
}

impl EmuError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmuError::UndefinedOpcode { .. }
            | EmuError::UndefinedEncoding { .. }
            | EmuError::BusLayout(_) => ErrorKind::Configuration,
            EmuError::AddressOutOfRange { .. } => ErrorKind::AddressOutOfRange,
            EmuError::UnsupportedMapper(_) => ErrorKind::UnsupportedMapper,
        }
    }
}
