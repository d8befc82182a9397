/*!
table.rs - Static instruction table for the 151 documented 6502 opcodes.

Purpose
=======
One data table maps every (mnemonic, addressing mode) pair the CPU
understands to its opcode byte, byte length and base cycle cost, plus a flag
telling whether a page crossing during operand resolution costs one more
cycle. The table is a stateless template: `dispatch` instantiates an entry
per fetch with concrete operand bytes and routes it by mnemonic tag to the
family handler.

Lookup directions
=================
- `decode(opcode)`: opcode byte -> entry, via a 256-slot array built at
  compile time from `INSTRUCTIONS`.
- `encode(mnemonic, mode)`: pair -> entry; a pair with no encoding is a
  `ConfigurationError` (`EmuError::UndefinedEncoding`).

Cycle notes
===========
- `page_penalty` is only set for read instructions in absolute,X /
  absolute,Y / (indirect),Y. Stores and read-modify-write always pay the
  worst case and carry it in their base cost.
- Branch extra cycles (taken, taken across a page) are computed by the
  branch handler, not the table.
*/

use std::fmt;

use crate::error::EmuError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Mnemonic {
    pub const fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS",
            Beq => "BEQ", Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL",
            Brk => "BRK", Bvc => "BVC", Bvs => "BVS", Clc => "CLC", Cld => "CLD",
            Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cpx => "CPX", Cpy => "CPY",
            Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR", Inc => "INC",
            Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR", Lda => "LDA",
            Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP", Ora => "ORA",
            Pha => "PHA", Php => "PHP", Pla => "PLA", Plp => "PLP", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC", Sec => "SEC",
            Sed => "SED", Sei => "SEI", Sta => "STA", Stx => "STX", Sty => "STY",
            Tax => "TAX", Tay => "TAY", Tsx => "TSX", Txa => "TXA", Txs => "TXS",
            Tya => "TYA",
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The 13 addressing modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddrMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
}

impl AddrMode {
    pub const ALL: [AddrMode; 13] = [
        AddrMode::Implicit,
        AddrMode::Accumulator,
        AddrMode::Immediate,
        AddrMode::ZeroPage,
        AddrMode::ZeroPageX,
        AddrMode::ZeroPageY,
        AddrMode::Relative,
        AddrMode::Absolute,
        AddrMode::AbsoluteX,
        AddrMode::AbsoluteY,
        AddrMode::Indirect,
        AddrMode::IndirectX,
        AddrMode::IndirectY,
    ];

    /// Instruction length in bytes, opcode included.
    pub const fn len(self) -> u8 {
        match self {
            AddrMode::Implicit | AddrMode::Accumulator => 1,
            AddrMode::Immediate
            | AddrMode::ZeroPage
            | AddrMode::ZeroPageX
            | AddrMode::ZeroPageY
            | AddrMode::Relative
            | AddrMode::IndirectX
            | AddrMode::IndirectY => 2,
            AddrMode::Absolute
            | AddrMode::AbsoluteX
            | AddrMode::AbsoluteY
            | AddrMode::Indirect => 3,
        }
    }
}

/// One table row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub mnemonic: Mnemonic,
    pub mode: AddrMode,
    pub cycles: u8,
    pub page_penalty: bool,
}

impl Instruction {
    #[inline]
    pub const fn len(&self) -> u8 {
        self.mode.len()
    }
}

const fn op(opcode: u8, mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Instruction {
    Instruction {
        opcode,
        mnemonic,
        mode,
        cycles,
        page_penalty: false,
    }
}

/// Read instruction whose indexed modes add a cycle on page crossing.
const fn opp(opcode: u8, mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Instruction {
    Instruction {
        opcode,
        mnemonic,
        mode,
        cycles,
        page_penalty: true,
    }
}

use AddrMode::{
    Absolute as Abs, AbsoluteX as AbsX, AbsoluteY as AbsY, Accumulator as Acc, Immediate as Imm,
    Implicit as Imp, Indirect as Ind, IndirectX as IndX, IndirectY as IndY, Relative as Rel,
    ZeroPage as Zp, ZeroPageX as ZpX, ZeroPageY as ZpY,
};
use Mnemonic::*;

#[rustfmt::skip]
pub const INSTRUCTIONS: [Instruction; 151] = [
    // Loads / stores
    op(0xA9, Lda, Imm, 2), op(0xA5, Lda, Zp, 3), op(0xB5, Lda, ZpX, 4), op(0xAD, Lda, Abs, 4),
    opp(0xBD, Lda, AbsX, 4), opp(0xB9, Lda, AbsY, 4), op(0xA1, Lda, IndX, 6), opp(0xB1, Lda, IndY, 5),
    op(0xA2, Ldx, Imm, 2), op(0xA6, Ldx, Zp, 3), op(0xB6, Ldx, ZpY, 4), op(0xAE, Ldx, Abs, 4),
    opp(0xBE, Ldx, AbsY, 4),
    op(0xA0, Ldy, Imm, 2), op(0xA4, Ldy, Zp, 3), op(0xB4, Ldy, ZpX, 4), op(0xAC, Ldy, Abs, 4),
    opp(0xBC, Ldy, AbsX, 4),
    op(0x85, Sta, Zp, 3), op(0x95, Sta, ZpX, 4), op(0x8D, Sta, Abs, 4), op(0x9D, Sta, AbsX, 5),
    op(0x99, Sta, AbsY, 5), op(0x81, Sta, IndX, 6), op(0x91, Sta, IndY, 6),
    op(0x86, Stx, Zp, 3), op(0x96, Stx, ZpY, 4), op(0x8E, Stx, Abs, 4),
    op(0x84, Sty, Zp, 3), op(0x94, Sty, ZpX, 4), op(0x8C, Sty, Abs, 4),

    // Arithmetic
    op(0x69, Adc, Imm, 2), op(0x65, Adc, Zp, 3), op(0x75, Adc, ZpX, 4), op(0x6D, Adc, Abs, 4),
    opp(0x7D, Adc, AbsX, 4), opp(0x79, Adc, AbsY, 4), op(0x61, Adc, IndX, 6), opp(0x71, Adc, IndY, 5),
    op(0xE9, Sbc, Imm, 2), op(0xE5, Sbc, Zp, 3), op(0xF5, Sbc, ZpX, 4), op(0xED, Sbc, Abs, 4),
    opp(0xFD, Sbc, AbsX, 4), opp(0xF9, Sbc, AbsY, 4), op(0xE1, Sbc, IndX, 6), opp(0xF1, Sbc, IndY, 5),

    // Logical
    op(0x29, And, Imm, 2), op(0x25, And, Zp, 3), op(0x35, And, ZpX, 4), op(0x2D, And, Abs, 4),
    opp(0x3D, And, AbsX, 4), opp(0x39, And, AbsY, 4), op(0x21, And, IndX, 6), opp(0x31, And, IndY, 5),
    op(0x09, Ora, Imm, 2), op(0x05, Ora, Zp, 3), op(0x15, Ora, ZpX, 4), op(0x0D, Ora, Abs, 4),
    opp(0x1D, Ora, AbsX, 4), opp(0x19, Ora, AbsY, 4), op(0x01, Ora, IndX, 6), opp(0x11, Ora, IndY, 5),
    op(0x49, Eor, Imm, 2), op(0x45, Eor, Zp, 3), op(0x55, Eor, ZpX, 4), op(0x4D, Eor, Abs, 4),
    opp(0x5D, Eor, AbsX, 4), opp(0x59, Eor, AbsY, 4), op(0x41, Eor, IndX, 6), opp(0x51, Eor, IndY, 5),
    op(0x24, Bit, Zp, 3), op(0x2C, Bit, Abs, 4),

    // Compare
    op(0xC9, Cmp, Imm, 2), op(0xC5, Cmp, Zp, 3), op(0xD5, Cmp, ZpX, 4), op(0xCD, Cmp, Abs, 4),
    opp(0xDD, Cmp, AbsX, 4), opp(0xD9, Cmp, AbsY, 4), op(0xC1, Cmp, IndX, 6), opp(0xD1, Cmp, IndY, 5),
    op(0xE0, Cpx, Imm, 2), op(0xE4, Cpx, Zp, 3), op(0xEC, Cpx, Abs, 4),
    op(0xC0, Cpy, Imm, 2), op(0xC4, Cpy, Zp, 3), op(0xCC, Cpy, Abs, 4),

    // Shifts, rotates, memory increment/decrement
    op(0x0A, Asl, Acc, 2), op(0x06, Asl, Zp, 5), op(0x16, Asl, ZpX, 6), op(0x0E, Asl, Abs, 6),
    op(0x1E, Asl, AbsX, 7),
    op(0x4A, Lsr, Acc, 2), op(0x46, Lsr, Zp, 5), op(0x56, Lsr, ZpX, 6), op(0x4E, Lsr, Abs, 6),
    op(0x5E, Lsr, AbsX, 7),
    op(0x2A, Rol, Acc, 2), op(0x26, Rol, Zp, 5), op(0x36, Rol, ZpX, 6), op(0x2E, Rol, Abs, 6),
    op(0x3E, Rol, AbsX, 7),
    op(0x6A, Ror, Acc, 2), op(0x66, Ror, Zp, 5), op(0x76, Ror, ZpX, 6), op(0x6E, Ror, Abs, 6),
    op(0x7E, Ror, AbsX, 7),
    op(0xE6, Inc, Zp, 5), op(0xF6, Inc, ZpX, 6), op(0xEE, Inc, Abs, 6), op(0xFE, Inc, AbsX, 7),
    op(0xC6, Dec, Zp, 5), op(0xD6, Dec, ZpX, 6), op(0xCE, Dec, Abs, 6), op(0xDE, Dec, AbsX, 7),

    // Branches
    op(0x90, Bcc, Rel, 2), op(0xB0, Bcs, Rel, 2), op(0xF0, Beq, Rel, 2), op(0x30, Bmi, Rel, 2),
    op(0xD0, Bne, Rel, 2), op(0x10, Bpl, Rel, 2), op(0x50, Bvc, Rel, 2), op(0x70, Bvs, Rel, 2),

    // Control flow
    op(0x4C, Jmp, Abs, 3), op(0x6C, Jmp, Ind, 5), op(0x20, Jsr, Abs, 6),
    op(0x60, Rts, Imp, 6), op(0x40, Rti, Imp, 6), op(0x00, Brk, Imp, 7),

    // Stack
    op(0x48, Pha, Imp, 3), op(0x08, Php, Imp, 3), op(0x68, Pla, Imp, 4), op(0x28, Plp, Imp, 4),

    // Register transfers and register increment/decrement
    op(0xAA, Tax, Imp, 2), op(0xA8, Tay, Imp, 2), op(0xBA, Tsx, Imp, 2), op(0x8A, Txa, Imp, 2),
    op(0x9A, Txs, Imp, 2), op(0x98, Tya, Imp, 2),
    op(0xE8, Inx, Imp, 2), op(0xC8, Iny, Imp, 2), op(0xCA, Dex, Imp, 2), op(0x88, Dey, Imp, 2),

    // Flags
    op(0x18, Clc, Imp, 2), op(0x38, Sec, Imp, 2), op(0x58, Cli, Imp, 2), op(0x78, Sei, Imp, 2),
    op(0xB8, Clv, Imp, 2), op(0xD8, Cld, Imp, 2), op(0xF8, Sed, Imp, 2),

    op(0xEA, Nop, Imp, 2),
];

const fn build_decode_table() -> [Option<Instruction>; 256] {
    let mut table: [Option<Instruction>; 256] = [None; 256];
    let mut i = 0;
    while i < INSTRUCTIONS.len() {
        table[INSTRUCTIONS[i].opcode as usize] = Some(INSTRUCTIONS[i]);
        i += 1;
    }
    table
}

static DECODE: [Option<Instruction>; 256] = build_decode_table();

/// Table entry for an opcode byte, if it is a documented instruction.
#[inline]
pub fn decode(opcode: u8) -> Option<&'static Instruction> {
    DECODE[opcode as usize].as_ref()
}

/// Table entry for a mnemonic in a given addressing mode.
pub fn encode(mnemonic: Mnemonic, mode: AddrMode) -> Result<&'static Instruction, EmuError> {
    INSTRUCTIONS
        .iter()
        .find(|i| i.mnemonic == mnemonic && i.mode == mode)
        .ok_or(EmuError::UndefinedEncoding { mnemonic, mode })
}

/// All rows, in table order.
pub fn instructions() -> &'static [Instruction] {
    &INSTRUCTIONS
}
