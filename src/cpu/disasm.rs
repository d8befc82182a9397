//! Assembler-syntax rendering of decoded instructions, used by trace logging
//! and debug tooling.

use std::fmt;

use crate::cpu::addressing::DecodedInstruction;
use crate::cpu::table::AddrMode;

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.instruction.mnemonic;
        let b = self.byte();
        let w = self.word();
        match self.instruction.mode {
            AddrMode::Implicit => write!(f, "{m}"),
            AddrMode::Accumulator => write!(f, "{m} A"),
            AddrMode::Immediate => write!(f, "{m} #${b:02X}"),
            AddrMode::ZeroPage => write!(f, "{m} ${b:02X}"),
            AddrMode::ZeroPageX => write!(f, "{m} ${b:02X},X"),
            AddrMode::ZeroPageY => write!(f, "{m} ${b:02X},Y"),
            AddrMode::Relative => {
                let target = self.next_pc().wrapping_add(b as i8 as u16);
                write!(f, "{m} ${target:04X}")
            }
            AddrMode::Absolute => write!(f, "{m} ${w:04X}"),
            AddrMode::AbsoluteX => write!(f, "{m} ${w:04X},X"),
            AddrMode::AbsoluteY => write!(f, "{m} ${w:04X},Y"),
            AddrMode::Indirect => write!(f, "{m} (${w:04X})"),
            AddrMode::IndirectX => write!(f, "{m} (${b:02X},X)"),
            AddrMode::IndirectY => write!(f, "{m} (${b:02X}),Y"),
        }
    }
}
